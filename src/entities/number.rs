//! Writable numeric controls
//!
//! Range metadata mirrors what the vendor app offers. Values at or below the
//! dispatcher floor are ignored there, so no range check is duplicated here.

use serde::Serialize;

use crate::commands;
use crate::weconnect::{VehicleGateway, VehicleSnapshot};

/// One rendered number control
#[derive(Debug, Clone, Serialize)]
pub struct NumberState {
    pub unique_id: String,
    pub name: String,
    pub key: &'static str,
    pub value: Option<f64>,
    pub available: bool,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: &'static str,
}

struct NumberDescriptor {
    key: &'static str,
    name: &'static str,
    min: f64,
    max: f64,
    step: f64,
    unit: &'static str,
    value: fn(&VehicleSnapshot) -> Option<f64>,
}

fn target_soc(v: &VehicleSnapshot) -> Option<f64> {
    v.charging_settings()?.target_soc_pct.map(|p| p as f64)
}

fn target_temperature(v: &VehicleSnapshot) -> Option<f64> {
    v.climatisation_settings()?.target_temperature_c
}

const NUMBERS: &[NumberDescriptor] = &[
    NumberDescriptor {
        key: "target_state_of_charge",
        name: "Target State Of Charge",
        min: 10.0,
        max: 100.0,
        step: 10.0,
        unit: "%",
        value: target_soc,
    },
    NumberDescriptor {
        key: "target_climate_temperature",
        name: "Target Climate Temperature",
        min: 10.0,
        max: 30.0,
        step: 0.5,
        unit: "°C",
        value: target_temperature,
    },
];

pub fn render(vehicle: &VehicleSnapshot) -> Vec<NumberState> {
    NUMBERS
        .iter()
        .map(|d| {
            let value = (d.value)(vehicle);
            NumberState {
                unique_id: super::entity_id(&vehicle.vin, d.key),
                name: super::entity_name(vehicle, d.name),
                key: d.key,
                available: value.is_some(),
                value,
                min: d.min,
                max: d.max,
                step: d.step,
                unit: d.unit,
            }
        })
        .collect()
}

/// Dispatch one number write. `None` means the key names no number control.
pub async fn set_value(
    vin: &str,
    key: &str,
    value: f64,
    gateway: &dyn VehicleGateway,
) -> Option<bool> {
    match key {
        "target_state_of_charge" => {
            Some(commands::set_target_soc(vin, gateway, value as i64).await)
        }
        "target_climate_temperature" => {
            Some(commands::set_climatisation(vin, gateway, None, value).await)
        }
        _ => None,
    }
}
