//! Read-only sensors
//!
//! One descriptor per exposed value. Keys follow the vendor field names so
//! ids stay stable across rewrites of this layer.

use serde::Serialize;
use serde_json::{Value, json};

use crate::weconnect::VehicleSnapshot;

/// One rendered sensor
#[derive(Debug, Clone, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    /// `Null` when the vehicle does not report the backing field
    pub state: Value,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

struct SensorDescriptor {
    key: &'static str,
    name: &'static str,
    unit: Option<&'static str>,
    device_class: Option<&'static str>,
    state_class: Option<&'static str>,
    icon: Option<&'static str>,
    value: fn(&VehicleSnapshot) -> Option<Value>,
}

fn charging_state(v: &VehicleSnapshot) -> Option<Value> {
    v.charging_status().map(|s| json!(s.state))
}

fn remaining_charging_time(v: &VehicleSnapshot) -> Option<Value> {
    v.charging_status()?.remaining_charging_time_min.map(|m| json!(m))
}

fn charge_power(v: &VehicleSnapshot) -> Option<Value> {
    v.charging_status()?.charge_power_kw.map(|p| json!(p))
}

fn state_of_charge(v: &VehicleSnapshot) -> Option<Value> {
    v.battery_status()?.current_soc_pct.map(|p| json!(p))
}

fn electric_range(v: &VehicleSnapshot) -> Option<Value> {
    v.battery_status()?.cruising_range_electric_km.map(|k| json!(k))
}

fn odometer(v: &VehicleSnapshot) -> Option<Value> {
    v.measurements.as_ref()?.odometer_km.map(|k| json!(k))
}

fn climatisation_state(v: &VehicleSnapshot) -> Option<Value> {
    v.climatisation_status().map(|s| json!(s.state))
}

fn remaining_climatisation_time(v: &VehicleSnapshot) -> Option<Value> {
    v.climatisation_status()?.remaining_time_min.map(|m| json!(m))
}

const SENSORS: &[SensorDescriptor] = &[
    SensorDescriptor {
        key: "chargingState",
        name: "Charging State",
        unit: None,
        device_class: None,
        state_class: None,
        icon: Some("mdi:ev-station"),
        value: charging_state,
    },
    SensorDescriptor {
        key: "remainingChargingTime",
        name: "Remaining Charging Time",
        unit: Some("min"),
        device_class: None,
        state_class: Some("measurement"),
        icon: None,
        value: remaining_charging_time,
    },
    SensorDescriptor {
        key: "chargePower_kW",
        name: "Charge Power",
        unit: Some("kW"),
        device_class: Some("power"),
        state_class: Some("measurement"),
        icon: None,
        value: charge_power,
    },
    SensorDescriptor {
        key: "currentSOC_pct",
        name: "State of Charge",
        unit: Some("%"),
        device_class: Some("battery"),
        state_class: Some("measurement"),
        icon: None,
        value: state_of_charge,
    },
    SensorDescriptor {
        key: "cruisingRangeElectric_km",
        name: "Electric Range",
        unit: Some("km"),
        device_class: None,
        state_class: Some("measurement"),
        icon: None,
        value: electric_range,
    },
    SensorDescriptor {
        key: "odometer_km",
        name: "Odometer",
        unit: Some("km"),
        device_class: None,
        state_class: Some("measurement"),
        icon: None,
        value: odometer,
    },
    SensorDescriptor {
        key: "climatisationState",
        name: "Climatisation State",
        unit: None,
        device_class: None,
        state_class: None,
        icon: Some("mdi:air-conditioner"),
        value: climatisation_state,
    },
    SensorDescriptor {
        key: "remainingClimatisationTime",
        name: "Remaining Climatisation Time",
        unit: Some("min"),
        device_class: None,
        state_class: Some("measurement"),
        icon: None,
        value: remaining_climatisation_time,
    },
];

pub fn render(vehicle: &VehicleSnapshot) -> Vec<SensorState> {
    SENSORS
        .iter()
        .map(|d| {
            let value = (d.value)(vehicle);
            SensorState {
                unique_id: super::entity_id(&vehicle.vin, d.key),
                name: super::entity_name(vehicle, d.name),
                available: value.is_some(),
                state: value.unwrap_or(Value::Null),
                unit: d.unit,
                device_class: d.device_class,
                state_class: d.state_class,
                icon: d.icon,
            }
        })
        .collect()
}
