//! Cupra We Connect account integration
//!
//! One [`VehicleGateway`] instance owns the cloud session and the mapping of
//! VIN to latest snapshot. The trait is the seam the coordinator, the command
//! dispatchers and the tests all talk through.

use crate::error::Result;

pub mod client;
pub mod decode;
pub mod types;

pub use client::WeConnectClient;
pub use types::{
    AccessDomain, BatteryStatus, ChargingDomain, ChargingSettings, ChargingState, ChargingStatus,
    ClimatisationDomain, ClimatisationSettings, ClimatisationState, ClimatisationStatus,
    ConnectionDomain, ConnectionState, ControlOperation, LockState, MaxChargeCurrent,
    MeasurementsDomain, OnOffState, ParkingDomain, PlugConnectionState, PlugStatus,
    VehicleSnapshot, WindowHeating,
};

/// Account-level vehicle gateway
#[async_trait::async_trait]
pub trait VehicleGateway: Send + Sync {
    /// Authenticate against the cloud account
    async fn login(&self) -> Result<()>;

    /// Fetch fresh state for every vehicle into the in-memory mapping
    async fn update(&self) -> Result<()>;

    /// All mapped vehicles, sorted by VIN
    fn vehicles(&self) -> Vec<VehicleSnapshot>;

    /// Exact-match VIN lookup
    fn vehicle(&self, vin: &str) -> Option<VehicleSnapshot>;

    /// Request the car to start or stop charging
    async fn send_charging_operation(&self, vin: &str, operation: ControlOperation) -> Result<()>;

    /// Request the car to start or stop climatisation
    async fn send_climatisation_operation(
        &self,
        vin: &str,
        operation: ControlOperation,
    ) -> Result<()>;

    /// Persist a new charging target on the car
    async fn set_target_soc(&self, vin: &str, target_soc_pct: i64) -> Result<()>;

    /// Persist the AC charging speed setting on the car
    async fn set_max_charge_current(&self, vin: &str, level: MaxChargeCurrent) -> Result<()>;

    /// Persist the cabin target temperature on the car
    async fn set_target_temperature(&self, vin: &str, temperature_c: f64) -> Result<()>;

    /// Best-effort session teardown
    async fn logout(&self) -> Result<()> {
        Ok(())
    }
}
