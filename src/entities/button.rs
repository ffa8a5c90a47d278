//! Action buttons
//!
//! Buttons exist for every vehicle regardless of capability; a press on a car
//! without the matching control resolves through the dispatcher guards as a
//! logged no-op.

use serde::Serialize;

use crate::commands;
use crate::weconnect::{ControlOperation, MaxChargeCurrent, VehicleGateway, VehicleSnapshot};

/// One rendered button
#[derive(Debug, Clone, Serialize)]
pub struct ButtonState {
    pub unique_id: String,
    pub name: String,
    pub key: &'static str,
}

struct ButtonDescriptor {
    key: &'static str,
    name: &'static str,
}

const BUTTONS: &[ButtonDescriptor] = &[
    ButtonDescriptor { key: "start_climate", name: "Start Climate" },
    ButtonDescriptor { key: "stop_climate", name: "Stop Climate" },
    ButtonDescriptor { key: "start_charging", name: "Start Charging" },
    ButtonDescriptor { key: "stop_charging", name: "Stop Charging" },
    ButtonDescriptor { key: "toggle_ac_charge_speed", name: "Toggle AC Charge Speed" },
];

pub fn render(vehicle: &VehicleSnapshot) -> Vec<ButtonState> {
    BUTTONS
        .iter()
        .map(|d| ButtonState {
            unique_id: super::entity_id(&vehicle.vin, d.key),
            name: super::entity_name(vehicle, d.name),
            key: d.key,
        })
        .collect()
}

/// Dispatch one button press. `None` means the key names no button.
pub async fn press(vin: &str, key: &str, gateway: &dyn VehicleGateway) -> Option<bool> {
    match key {
        "start_climate" => Some(
            commands::set_climatisation(vin, gateway, Some(ControlOperation::Start), 0.0).await,
        ),
        "stop_climate" => Some(
            commands::set_climatisation(vin, gateway, Some(ControlOperation::Stop), 0.0).await,
        ),
        "start_charging" => {
            Some(commands::start_stop_charging(vin, gateway, ControlOperation::Start).await)
        }
        "stop_charging" => {
            Some(commands::start_stop_charging(vin, gateway, ControlOperation::Stop).await)
        }
        "toggle_ac_charge_speed" => Some(toggle_ac_charge_speed(vin, gateway).await),
        _ => None,
    }
}

/// Only a current value of maximum flips to reduced; reduced or unknown flips
/// back to maximum.
async fn toggle_ac_charge_speed(vin: &str, gateway: &dyn VehicleGateway) -> bool {
    let current = gateway
        .vehicle(vin)
        .and_then(|v| v.charging_settings().and_then(|s| s.max_charge_current_ac));
    let next = match current {
        Some(MaxChargeCurrent::Maximum) => MaxChargeCurrent::Reduced,
        _ => MaxChargeCurrent::Maximum,
    };
    commands::set_ac_charging_speed(vin, gateway, next).await
}
