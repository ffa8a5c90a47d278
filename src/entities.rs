//! Entity rendering
//!
//! Presentational layer over [`VehicleSnapshot`]: descriptor tables map each
//! exposed capability onto a sensor, binary sensor, button, number or device
//! tracker state. Fields a vehicle does not report (hybrids without EV
//! telemetry, cars without parking data) render as unavailable, never as
//! errors. Buttons and numbers forward their actions to the command
//! dispatchers in [`crate::commands`].

pub mod binary_sensor;
pub mod button;
pub mod device_tracker;
pub mod number;
pub mod sensor;

pub use binary_sensor::BinarySensorState;
pub use button::ButtonState;
pub use device_tracker::TrackerState;
pub use number::NumberState;
pub use sensor::SensorState;

use serde::Serialize;

use crate::weconnect::VehicleSnapshot;

/// Every platform rendered for one vehicle
#[derive(Debug, Clone, Serialize)]
pub struct VehicleEntities {
    pub vin: String,
    pub display_name: String,
    pub sensors: Vec<SensorState>,
    pub binary_sensors: Vec<BinarySensorState>,
    pub buttons: Vec<ButtonState>,
    pub numbers: Vec<NumberState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_tracker: Option<TrackerState>,
}

/// Render all entity platforms for one vehicle
pub fn vehicle_entities(vehicle: &VehicleSnapshot) -> VehicleEntities {
    VehicleEntities {
        vin: vehicle.vin.clone(),
        display_name: vehicle.display_name().to_string(),
        sensors: sensor::render(vehicle),
        binary_sensors: binary_sensor::render(vehicle),
        buttons: button::render(vehicle),
        numbers: number::render(vehicle),
        device_tracker: device_tracker::render(vehicle),
    }
}

/// Stable per-entity id: `{vin}-{key}`
pub(crate) fn entity_id(vin: &str, key: &str) -> String {
    format!("{}-{}", vin, key)
}

/// Display name: `{vehicle name} {entity name}`
pub(crate) fn entity_name(vehicle: &VehicleSnapshot, name: &str) -> String {
    format!("{} {}", vehicle.display_name(), name)
}
