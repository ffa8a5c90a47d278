//! Shared test doubles and snapshot builders
//!
//! `StubGateway` stands in for the We Connect client: it serves canned
//! snapshots from an in-memory map and records every remote call so tests can
//! assert exactly what was (or was not) sent to the car.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use formentor::error::{FormentorError, Result};
use formentor::weconnect::{
    AccessDomain, BatteryStatus, ChargingDomain, ChargingSettings, ChargingState, ChargingStatus,
    ClimatisationDomain, ClimatisationSettings, ClimatisationState, ClimatisationStatus,
    ConnectionDomain, ConnectionState, ControlOperation, LockState, MaxChargeCurrent,
    MeasurementsDomain, OnOffState, ParkingDomain, PlugConnectionState, PlugStatus,
    VehicleGateway, VehicleSnapshot, WindowHeating,
};

pub const EV_VIN: &str = "VSSZZZK1ZPP000001";
pub const HYBRID_VIN: &str = "VSSZZZKMZRP000002";

/// Gateway double with a canned vehicle map and a call journal
#[derive(Default)]
pub struct StubGateway {
    vehicles: Mutex<HashMap<String, VehicleSnapshot>>,
    calls: Mutex<Vec<String>>,
    update_delay: Mutex<Option<Duration>>,
    pub fail_sends: AtomicBool,
    pub fail_update: AtomicBool,
}

impl StubGateway {
    pub fn with_vehicles(vehicles: Vec<VehicleSnapshot>) -> Self {
        let map = vehicles.into_iter().map(|v| (v.vin.clone(), v)).collect();
        Self {
            vehicles: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Every remote call so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn replace_vehicle(&self, snapshot: VehicleSnapshot) {
        self.vehicles
            .lock()
            .unwrap()
            .insert(snapshot.vin.clone(), snapshot);
    }

    pub fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn send_outcome(&self) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            Err(FormentorError::api("stubbed send failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl VehicleGateway for StubGateway {
    async fn login(&self) -> Result<()> {
        self.record("login".to_string());
        Ok(())
    }

    async fn update(&self) -> Result<()> {
        self.record("update".to_string());
        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(FormentorError::api("stubbed update failure"));
        }
        Ok(())
    }

    fn vehicles(&self) -> Vec<VehicleSnapshot> {
        let mut list: Vec<_> = self.vehicles.lock().unwrap().values().cloned().collect();
        list.sort_by(|a, b| a.vin.cmp(&b.vin));
        list
    }

    fn vehicle(&self, vin: &str) -> Option<VehicleSnapshot> {
        self.vehicles.lock().unwrap().get(vin).cloned()
    }

    async fn send_charging_operation(&self, vin: &str, operation: ControlOperation) -> Result<()> {
        self.record(format!("charging:{}:{}", vin, operation.as_str()));
        self.send_outcome()
    }

    async fn send_climatisation_operation(
        &self,
        vin: &str,
        operation: ControlOperation,
    ) -> Result<()> {
        self.record(format!("climatisation:{}:{}", vin, operation.as_str()));
        self.send_outcome()
    }

    async fn set_target_soc(&self, vin: &str, target_soc_pct: i64) -> Result<()> {
        self.record(format!("target_soc:{}:{}", vin, target_soc_pct));
        self.send_outcome()
    }

    async fn set_max_charge_current(&self, vin: &str, level: MaxChargeCurrent) -> Result<()> {
        self.record(format!("max_current:{}:{}", vin, level.as_str()));
        self.send_outcome()
    }

    async fn set_target_temperature(&self, vin: &str, temperature_c: f64) -> Result<()> {
        self.record(format!("target_temperature:{}:{}", vin, temperature_c));
        self.send_outcome()
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout".to_string());
        Ok(())
    }
}

/// Fully equipped EV: every domain populated, remote control allowed
pub fn ev_snapshot() -> VehicleSnapshot {
    VehicleSnapshot {
        vin: EV_VIN.to_string(),
        model: Some("Born".to_string()),
        nickname: Some("Schnucki".to_string()),
        charging: Some(ChargingDomain {
            status: Some(ChargingStatus {
                state: ChargingState::Charging,
                remaining_charging_time_min: Some(95),
                charge_power_kw: Some(7.2),
                charge_rate_kmph: Some(32.0),
            }),
            settings: Some(ChargingSettings {
                target_soc_pct: Some(80),
                max_charge_current_ac: Some(MaxChargeCurrent::Maximum),
            }),
            battery: Some(BatteryStatus {
                current_soc_pct: Some(55),
                cruising_range_electric_km: Some(210),
            }),
            plug: Some(PlugStatus {
                connection_state: PlugConnectionState::Connected,
                lock_state: LockState::Locked,
            }),
            control_enabled: true,
        }),
        climatisation: Some(ClimatisationDomain {
            status: Some(ClimatisationStatus {
                state: ClimatisationState::Heating,
                remaining_time_min: Some(12),
            }),
            settings: Some(ClimatisationSettings {
                target_temperature_c: Some(21.5),
            }),
            window_heating: Some(WindowHeating {
                front: OnOffState::On,
                rear: OnOffState::Off,
            }),
            control_enabled: true,
        }),
        access: Some(AccessDomain {
            door_lock: LockState::Locked,
            engine: OnOffState::Off,
            lights: OnOffState::Off,
        }),
        connection: Some(ConnectionDomain {
            state: ConnectionState::Online,
        }),
        measurements: Some(MeasurementsDomain {
            odometer_km: Some(12431),
        }),
        parking: Some(ParkingDomain {
            latitude: 52.3061,
            longitude: 5.0419,
            captured_at: Some(Utc.with_ymd_and_hms(2026, 2, 14, 18, 30, 0).unwrap()),
        }),
        fetched_at: Utc::now(),
    }
}

/// Plug-in hybrid: charging domain present but without settings, battery
/// telemetry or remote control, no climatisation, no parking position
pub fn hybrid_snapshot() -> VehicleSnapshot {
    VehicleSnapshot {
        vin: HYBRID_VIN.to_string(),
        model: Some("Formentor".to_string()),
        nickname: None,
        charging: Some(ChargingDomain {
            status: Some(ChargingStatus {
                state: ChargingState::ReadyForCharging,
                remaining_charging_time_min: None,
                charge_power_kw: None,
                charge_rate_kmph: None,
            }),
            settings: None,
            battery: None,
            plug: Some(PlugStatus {
                connection_state: PlugConnectionState::Disconnected,
                lock_state: LockState::Unlocked,
            }),
            control_enabled: false,
        }),
        climatisation: None,
        access: Some(AccessDomain {
            door_lock: LockState::Unlocked,
            engine: OnOffState::Off,
            lights: OnOffState::Off,
        }),
        connection: Some(ConnectionDomain {
            state: ConnectionState::Offline,
        }),
        measurements: Some(MeasurementsDomain {
            odometer_km: Some(48712),
        }),
        parking: None,
        fetched_at: Utc::now(),
    }
}

/// Snapshot with nothing but a VIN; every entity rendered from it must be
/// unavailable rather than an error
pub fn bare_snapshot(vin: &str) -> VehicleSnapshot {
    VehicleSnapshot {
        vin: vin.to_string(),
        model: None,
        nickname: None,
        charging: None,
        climatisation: None,
        access: None,
        connection: None,
        measurements: None,
        parking: None,
        fetched_at: Utc::now(),
    }
}

/// Minimal valid config for tests that need one
pub fn test_config() -> formentor::Config {
    let mut config = formentor::Config::default();
    config.account.username = "driver@example.com".to_string();
    config.account.password = "hunter2".to_string();
    config
}
