//! Parking position tracker
//!
//! Only rendered when the account reports a parking position; cars that are
//! driving (or accounts without the capability) have no tracker at all.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::weconnect::VehicleSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct TrackerState {
    pub unique_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: Option<DateTime<Utc>>,
}

pub fn render(vehicle: &VehicleSnapshot) -> Option<TrackerState> {
    vehicle.parking.as_ref().map(|p| TrackerState {
        unique_id: super::entity_id(&vehicle.vin, "parking_position"),
        name: super::entity_name(vehicle, "Parking Position"),
        latitude: p.latitude,
        longitude: p.longitude,
        captured_at: p.captured_at,
    })
}
