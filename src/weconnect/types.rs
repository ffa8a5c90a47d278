//! Typed vehicle state model
//!
//! Snapshots are built once per refresh from the vendor payloads. Every domain
//! a given car does not report is `None`, so downstream consumers branch on
//! presence instead of probing raw JSON.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Charging activity as reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingState {
    Off,
    ReadyForCharging,
    NotReadyForCharging,
    Conservation,
    Charging,
    Error,
    Unsupported,
    Unknown,
}

impl ChargingState {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "readyforcharging" => Self::ReadyForCharging,
            "notreadyforcharging" => Self::NotReadyForCharging,
            "conservation" => Self::Conservation,
            "charging" => Self::Charging,
            "error" => Self::Error,
            "unsupported" => Self::Unsupported,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::ReadyForCharging => "readyForCharging",
            Self::NotReadyForCharging => "notReadyForCharging",
            Self::Conservation => "conservation",
            Self::Charging => "charging",
            Self::Error => "error",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
        }
    }
}

/// Whether the charging cable is plugged in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlugConnectionState {
    Connected,
    Disconnected,
    Unknown,
}

impl PlugConnectionState {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "connected" => Self::Connected,
            "disconnected" => Self::Disconnected,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Unknown => "unknown",
        }
    }
}

/// Lock state for doors and the charging plug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocked,
    Unknown,
}

impl LockState {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "locked" => Self::Locked,
            "unlocked" => Self::Unlocked,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Unknown => "unknown",
        }
    }
}

/// Two-state signal used for engine, lights and window heating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOffState {
    On,
    Off,
    Unknown,
}

impl OnOffState {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "on" => Self::On,
            "off" => Self::Off,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }
}

/// Cloud reachability of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Online,
    Offline,
    Unknown,
}

impl ConnectionState {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "online" => Self::Online,
            "offline" => Self::Offline,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

/// Climatisation activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimatisationState {
    Off,
    Heating,
    Cooling,
    Ventilation,
    Unknown,
}

impl ClimatisationState {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "heating" => Self::Heating,
            "cooling" => Self::Cooling,
            "ventilation" => Self::Ventilation,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heating => "heating",
            Self::Cooling => "cooling",
            Self::Ventilation => "ventilation",
            Self::Unknown => "unknown",
        }
    }
}

/// AC charging speed setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxChargeCurrent {
    Maximum,
    Reduced,
    Unknown,
}

impl MaxChargeCurrent {
    pub fn from_label(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "maximum" => Self::Maximum,
            "reduced" => Self::Reduced,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maximum => "maximum",
            Self::Reduced => "reduced",
            Self::Unknown => "unknown",
        }
    }
}

/// Start/stop verb for remote charging and climatisation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOperation {
    Start,
    Stop,
}

impl ControlOperation {
    /// Strict parse used at the API boundary; anything else is rejected there
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

macro_rules! serialize_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(
                    &self,
                    serializer: S,
                ) -> std::result::Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }
        )+
    };
}

serialize_as_str!(
    ChargingState,
    PlugConnectionState,
    LockState,
    OnOffState,
    ConnectionState,
    ClimatisationState,
    MaxChargeCurrent,
    ControlOperation,
);

/// Live charging telemetry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargingStatus {
    pub state: ChargingState,

    /// Minutes until the target state of charge is reached
    pub remaining_charging_time_min: Option<i64>,

    /// Present AC/DC power draw; some hybrids never report this
    pub charge_power_kw: Option<f64>,

    pub charge_rate_kmph: Option<f64>,
}

/// Persisted charging preferences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargingSettings {
    pub target_soc_pct: Option<i64>,
    pub max_charge_current_ac: Option<MaxChargeCurrent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryStatus {
    pub current_soc_pct: Option<i64>,
    pub cruising_range_electric_km: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlugStatus {
    pub connection_state: PlugConnectionState,
    pub lock_state: LockState,
}

/// Everything the charging domain reports for one car
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargingDomain {
    pub status: Option<ChargingStatus>,
    pub settings: Option<ChargingSettings>,
    pub battery: Option<BatteryStatus>,
    pub plug: Option<PlugStatus>,

    /// Whether the account may send remote charging requests for this car
    pub control_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimatisationStatus {
    pub state: ClimatisationState,
    pub remaining_time_min: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimatisationSettings {
    pub target_temperature_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowHeating {
    pub front: OnOffState,
    pub rear: OnOffState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimatisationDomain {
    pub status: Option<ClimatisationStatus>,
    pub settings: Option<ClimatisationSettings>,
    pub window_heating: Option<WindowHeating>,

    /// Whether the account may send remote climatisation requests for this car
    pub control_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDomain {
    pub door_lock: LockState,
    pub engine: OnOffState,
    pub lights: OnOffState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionDomain {
    pub state: ConnectionState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementsDomain {
    pub odometer_km: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingDomain {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: Option<DateTime<Utc>>,
}

/// Immutable state of one vehicle at a single refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub vin: String,
    pub model: Option<String>,
    pub nickname: Option<String>,
    pub charging: Option<ChargingDomain>,
    pub climatisation: Option<ClimatisationDomain>,
    pub access: Option<AccessDomain>,
    pub connection: Option<ConnectionDomain>,
    pub measurements: Option<MeasurementsDomain>,
    pub parking: Option<ParkingDomain>,
    pub fetched_at: DateTime<Utc>,
}

impl VehicleSnapshot {
    /// Human-facing name, falling back to the VIN
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.vin)
    }

    pub fn charging_status(&self) -> Option<&ChargingStatus> {
        self.charging.as_ref()?.status.as_ref()
    }

    pub fn charging_settings(&self) -> Option<&ChargingSettings> {
        self.charging.as_ref()?.settings.as_ref()
    }

    pub fn battery_status(&self) -> Option<&BatteryStatus> {
        self.charging.as_ref()?.battery.as_ref()
    }

    pub fn plug_status(&self) -> Option<&PlugStatus> {
        self.charging.as_ref()?.plug.as_ref()
    }

    pub fn climatisation_status(&self) -> Option<&ClimatisationStatus> {
        self.climatisation.as_ref()?.status.as_ref()
    }

    pub fn climatisation_settings(&self) -> Option<&ClimatisationSettings> {
        self.climatisation.as_ref()?.settings.as_ref()
    }

    pub fn charging_control_enabled(&self) -> bool {
        self.charging.as_ref().is_some_and(|c| c.control_enabled)
    }

    pub fn climatisation_control_enabled(&self) -> bool {
        self.climatisation
            .as_ref()
            .is_some_and(|c| c.control_enabled)
    }
}
