//! Binary sensors
//!
//! The device class tells the consumer how to phrase the two states; the
//! `is_on` extractor encodes which vendor label counts as "on". Note the lock
//! sensor is on when the doors are unlocked.

use serde::Serialize;

use crate::weconnect::{ConnectionState, LockState, OnOffState, PlugConnectionState, VehicleSnapshot};

/// One rendered binary sensor
#[derive(Debug, Clone, Serialize)]
pub struct BinarySensorState {
    pub unique_id: String,
    pub name: String,
    pub is_on: Option<bool>,
    pub available: bool,
    pub device_class: &'static str,
}

struct BinarySensorDescriptor {
    key: &'static str,
    name: &'static str,
    device_class: &'static str,
    is_on: fn(&VehicleSnapshot) -> Option<bool>,
}

fn plug_connected(v: &VehicleSnapshot) -> Option<bool> {
    v.plug_status()
        .map(|p| p.connection_state == PlugConnectionState::Connected)
}

fn doors_unlocked(v: &VehicleSnapshot) -> Option<bool> {
    v.access.as_ref().map(|a| a.door_lock == LockState::Unlocked)
}

fn car_online(v: &VehicleSnapshot) -> Option<bool> {
    v.connection
        .as_ref()
        .map(|c| c.state == ConnectionState::Online)
}

fn engine_on(v: &VehicleSnapshot) -> Option<bool> {
    v.access.as_ref().map(|a| a.engine == OnOffState::On)
}

fn lights_on(v: &VehicleSnapshot) -> Option<bool> {
    v.access.as_ref().map(|a| a.lights == OnOffState::On)
}

fn window_heating_on(v: &VehicleSnapshot) -> Option<bool> {
    v.climatisation
        .as_ref()?
        .window_heating
        .as_ref()
        .map(|w| w.front == OnOffState::On || w.rear == OnOffState::On)
}

const BINARY_SENSORS: &[BinarySensorDescriptor] = &[
    BinarySensorDescriptor {
        key: "plugConnectionState",
        name: "Plug Connection State",
        device_class: "plug",
        is_on: plug_connected,
    },
    BinarySensorDescriptor {
        key: "doorLockStatus",
        name: "Door Lock Status",
        device_class: "lock",
        is_on: doors_unlocked,
    },
    BinarySensorDescriptor {
        key: "isOnline",
        name: "Car Is Online",
        device_class: "connectivity",
        is_on: car_online,
    },
    BinarySensorDescriptor {
        key: "engineStatus",
        name: "Engine Status",
        device_class: "power",
        is_on: engine_on,
    },
    BinarySensorDescriptor {
        key: "lightsStatus",
        name: "Lights Status",
        device_class: "light",
        is_on: lights_on,
    },
    BinarySensorDescriptor {
        key: "windowHeating",
        name: "Window Heating",
        device_class: "heat",
        is_on: window_heating_on,
    },
];

pub fn render(vehicle: &VehicleSnapshot) -> Vec<BinarySensorState> {
    BINARY_SENSORS
        .iter()
        .map(|d| {
            let is_on = (d.is_on)(vehicle);
            BinarySensorState {
                unique_id: super::entity_id(&vehicle.vin, d.key),
                name: super::entity_name(vehicle, d.name),
                available: is_on.is_some(),
                is_on,
                device_class: d.device_class,
            }
        })
        .collect()
}
