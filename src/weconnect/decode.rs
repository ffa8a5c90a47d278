//! Decoding of vendor status payloads into [`VehicleSnapshot`] domains
//!
//! The vendor API is tolerant-by-necessity territory: fields appear and
//! disappear per model year, numbers occasionally arrive as strings, and
//! hybrids omit whole reports. Everything here maps bad shapes to `None`
//! rather than failing the refresh.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::{
    AccessDomain, BatteryStatus, ChargingDomain, ChargingSettings, ChargingState, ChargingStatus,
    ClimatisationDomain, ClimatisationSettings, ClimatisationState, ClimatisationStatus,
    ConnectionDomain, ConnectionState, LockState, MaxChargeCurrent, MeasurementsDomain, OnOffState,
    ParkingDomain, PlugConnectionState, PlugStatus, VehicleSnapshot, WindowHeating,
};

/// One vehicle entry from the garage listing
#[derive(Debug, Clone)]
pub struct GarageVehicle {
    pub vin: String,
    pub model: Option<String>,
    pub nickname: Option<String>,
    pub capabilities: Vec<String>,
}

/// Parse the garage listing; entries without a VIN are dropped
pub fn garage_vehicles(doc: &Value) -> Vec<GarageVehicle> {
    let Some(entries) = doc.get("vehicles").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let vin = entry.get("vin")?.as_str()?.to_string();
            let capabilities = entry
                .get("capabilities")
                .and_then(Value::as_array)
                .map(|caps| {
                    caps.iter()
                        .filter_map(|c| c.get("id").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(GarageVehicle {
                vin,
                model: entry
                    .get("model")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                nickname: entry
                    .get("nickname")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                capabilities,
            })
        })
        .collect()
}

/// Build one snapshot from a garage entry plus its status document
pub fn vehicle_snapshot(
    garage: &GarageVehicle,
    status_doc: &Value,
    fetched_at: DateTime<Utc>,
) -> VehicleSnapshot {
    let has_capability = |id: &str| garage.capabilities.iter().any(|c| c == id);
    VehicleSnapshot {
        vin: garage.vin.clone(),
        model: garage.model.clone(),
        nickname: garage.nickname.clone(),
        charging: charging_domain(status_doc, has_capability("charging")),
        climatisation: climatisation_domain(status_doc, has_capability("climatisation")),
        access: access_domain(status_doc),
        connection: connection_domain(status_doc),
        measurements: measurements_domain(status_doc),
        parking: parking_domain(status_doc),
        fetched_at,
    }
}

/// Every report nests its payload under a single `value` container.
/// Exactly one level is unwrapped; deeper nesting belongs to the report
/// itself and stays visible to the caller.
fn job_value<'a>(doc: &'a Value, domain: &str, job: &str) -> Option<&'a Value> {
    doc.get(domain)?.get(job)?.get("value")
}

/// Integer field that may arrive as an int, a float, or a numeric string
fn opt_i64(v: Option<&Value>) -> Option<i64> {
    let v = v?;
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return Some(f.round() as i64);
    }
    v.as_str()?.trim().parse().ok()
}

/// Float field that may arrive as a number or a numeric string
fn opt_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    if let Some(f) = v.as_f64() {
        return Some(f);
    }
    v.as_str()?.trim().parse().ok()
}

fn charging_domain(doc: &Value, control_enabled: bool) -> Option<ChargingDomain> {
    doc.get("charging")?;

    let status = job_value(doc, "charging", "chargingStatus").map(|v| ChargingStatus {
        state: v
            .get("chargingState")
            .and_then(Value::as_str)
            .map_or(ChargingState::Unknown, ChargingState::from_label),
        remaining_charging_time_min: opt_i64(v.get("remainingChargingTimeToComplete_min")),
        charge_power_kw: opt_f64(v.get("chargePower_kW")),
        charge_rate_kmph: opt_f64(v.get("chargeRate_kmph")),
    });

    let settings = job_value(doc, "charging", "chargingSettings").map(|v| ChargingSettings {
        target_soc_pct: opt_i64(v.get("targetSOC_pct")),
        max_charge_current_ac: v
            .get("maxChargeCurrentAC")
            .and_then(Value::as_str)
            .map(MaxChargeCurrent::from_label),
    });

    let battery = job_value(doc, "charging", "batteryStatus").map(|v| BatteryStatus {
        current_soc_pct: opt_i64(v.get("currentSOC_pct")),
        cruising_range_electric_km: opt_i64(v.get("cruisingRangeElectric_km")),
    });

    let plug = job_value(doc, "charging", "plugStatus").map(|v| PlugStatus {
        connection_state: v
            .get("plugConnectionState")
            .and_then(Value::as_str)
            .map_or(PlugConnectionState::Unknown, PlugConnectionState::from_label),
        lock_state: v
            .get("plugLockState")
            .and_then(Value::as_str)
            .map_or(LockState::Unknown, LockState::from_label),
    });

    Some(ChargingDomain {
        status,
        settings,
        battery,
        plug,
        control_enabled,
    })
}

fn climatisation_domain(doc: &Value, control_enabled: bool) -> Option<ClimatisationDomain> {
    doc.get("climatisation")?;

    let status =
        job_value(doc, "climatisation", "climatisationStatus").map(|v| ClimatisationStatus {
            state: v
                .get("climatisationState")
                .and_then(Value::as_str)
                .map_or(ClimatisationState::Unknown, ClimatisationState::from_label),
            remaining_time_min: opt_i64(v.get("remainingClimatisationTime_min")),
        });

    let settings =
        job_value(doc, "climatisation", "climatisationSettings").map(|v| ClimatisationSettings {
            target_temperature_c: opt_f64(v.get("targetTemperature_C")),
        });

    let window_heating = job_value(doc, "climatisation", "windowHeatingStatus")
        .and_then(|v| v.get("windowHeatingStatus"))
        .and_then(Value::as_array)
        .map(|windows| {
            let mut heating = WindowHeating {
                front: OnOffState::Unknown,
                rear: OnOffState::Unknown,
            };
            for window in windows {
                let state = window
                    .get("windowHeatingState")
                    .and_then(Value::as_str)
                    .map_or(OnOffState::Unknown, OnOffState::from_label);
                match window.get("windowLocation").and_then(Value::as_str) {
                    Some("front") => heating.front = state,
                    Some("rear") => heating.rear = state,
                    _ => {}
                }
            }
            heating
        });

    Some(ClimatisationDomain {
        status,
        settings,
        window_heating,
        control_enabled,
    })
}

fn access_domain(doc: &Value) -> Option<AccessDomain> {
    let v = job_value(doc, "access", "accessStatus")?;
    Some(AccessDomain {
        door_lock: v
            .get("doorLockStatus")
            .and_then(Value::as_str)
            .map_or(LockState::Unknown, LockState::from_label),
        engine: v
            .get("engineStatus")
            .and_then(Value::as_str)
            .map_or(OnOffState::Unknown, OnOffState::from_label),
        lights: v
            .get("lightsStatus")
            .and_then(Value::as_str)
            .map_or(OnOffState::Unknown, OnOffState::from_label),
    })
}

fn connection_domain(doc: &Value) -> Option<ConnectionDomain> {
    let v = job_value(doc, "status", "connectionStatus")?;
    Some(ConnectionDomain {
        state: v
            .get("connectionState")
            .and_then(Value::as_str)
            .map_or(ConnectionState::Unknown, ConnectionState::from_label),
    })
}

fn measurements_domain(doc: &Value) -> Option<MeasurementsDomain> {
    let v = job_value(doc, "measurements", "odometerStatus")?;
    Some(MeasurementsDomain {
        odometer_km: opt_i64(v.get("odometer")),
    })
}

fn parking_domain(doc: &Value) -> Option<ParkingDomain> {
    let v = job_value(doc, "parking", "parkingPosition")?;
    // A position without coordinates is useless; skip the whole domain
    let latitude = opt_f64(v.get("lat"))?;
    let longitude = opt_f64(v.get("lon"))?;
    let captured_at = v
        .get("carCapturedTimestamp")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok());
    Some(ParkingDomain {
        latitude,
        longitude,
        captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_status_doc() -> Value {
        json!({
            "charging": {
                "chargingStatus": {"value": {
                    "chargingState": "charging",
                    "remainingChargingTimeToComplete_min": 225,
                    "chargePower_kW": 7.2,
                    "chargeRate_kmph": 35.0
                }},
                "chargingSettings": {"value": {
                    "targetSOC_pct": 80,
                    "maxChargeCurrentAC": "maximum"
                }},
                "batteryStatus": {"value": {
                    "currentSOC_pct": 55,
                    "cruisingRangeElectric_km": 210
                }},
                "plugStatus": {"value": {
                    "plugConnectionState": "connected",
                    "plugLockState": "locked"
                }}
            },
            "climatisation": {
                "climatisationStatus": {"value": {
                    "climatisationState": "heating",
                    "remainingClimatisationTime_min": 12
                }},
                "climatisationSettings": {"value": {
                    "targetTemperature_C": 21.5
                }},
                "windowHeatingStatus": {"value": {
                    "windowHeatingStatus": [
                        {"windowLocation": "front", "windowHeatingState": "on"},
                        {"windowLocation": "rear", "windowHeatingState": "off"}
                    ]
                }}
            },
            "access": {
                "accessStatus": {"value": {
                    "doorLockStatus": "locked",
                    "engineStatus": "off",
                    "lightsStatus": "off"
                }}
            },
            "status": {
                "connectionStatus": {"value": {"connectionState": "online"}}
            },
            "measurements": {
                "odometerStatus": {"value": {"odometer": 12345}}
            },
            "parking": {
                "parkingPosition": {"value": {
                    "lat": 52.0907,
                    "lon": 5.1214,
                    "carCapturedTimestamp": "2025-08-25T09:30:00Z"
                }}
            }
        })
    }

    fn garage(capabilities: &[&str]) -> GarageVehicle {
        GarageVehicle {
            vin: "VSSZZZ7PZNR000001".to_string(),
            model: Some("Formentor".to_string()),
            nickname: Some("Born".to_string()),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_full_document_decodes_all_domains() {
        let doc = full_status_doc();
        let snapshot = vehicle_snapshot(
            &garage(&["charging", "climatisation"]),
            &doc,
            chrono::Utc::now(),
        );

        let charging = snapshot.charging.as_ref().unwrap();
        assert!(charging.control_enabled);
        let status = charging.status.as_ref().unwrap();
        assert_eq!(status.state, ChargingState::Charging);
        assert_eq!(status.remaining_charging_time_min, Some(225));
        assert_eq!(status.charge_power_kw, Some(7.2));
        assert_eq!(
            charging.settings.as_ref().unwrap().max_charge_current_ac,
            Some(MaxChargeCurrent::Maximum)
        );
        assert_eq!(charging.battery.as_ref().unwrap().current_soc_pct, Some(55));
        assert_eq!(
            charging.plug.as_ref().unwrap().connection_state,
            PlugConnectionState::Connected
        );

        let climatisation = snapshot.climatisation.as_ref().unwrap();
        assert_eq!(
            climatisation.settings.as_ref().unwrap().target_temperature_c,
            Some(21.5)
        );
        let windows = climatisation.window_heating.as_ref().unwrap();
        assert_eq!(windows.front, OnOffState::On);
        assert_eq!(windows.rear, OnOffState::Off);

        assert_eq!(snapshot.access.as_ref().unwrap().door_lock, LockState::Locked);
        assert_eq!(
            snapshot.connection.as_ref().unwrap().state,
            ConnectionState::Online
        );
        assert_eq!(
            snapshot.measurements.as_ref().unwrap().odometer_km,
            Some(12345)
        );
        let parking = snapshot.parking.as_ref().unwrap();
        assert_eq!(parking.latitude, 52.0907);
        assert!(parking.captured_at.is_some());
    }

    #[test]
    fn test_missing_domains_stay_absent() {
        // A hybrid that reports neither climatisation nor parking
        let doc = json!({
            "charging": {
                "chargingStatus": {"value": {"chargingState": "off"}}
            },
            "access": {
                "accessStatus": {"value": {"doorLockStatus": "unlocked"}}
            }
        });
        let snapshot = vehicle_snapshot(&garage(&[]), &doc, chrono::Utc::now());
        assert!(snapshot.climatisation.is_none());
        assert!(snapshot.parking.is_none());
        assert!(snapshot.measurements.is_none());
        assert!(snapshot.connection.is_none());

        let charging = snapshot.charging.as_ref().unwrap();
        assert!(!charging.control_enabled);
        // Fields the car never sent stay None instead of defaulting
        let status = charging.status.as_ref().unwrap();
        assert_eq!(status.charge_power_kw, None);
        assert_eq!(status.remaining_charging_time_min, None);
        assert!(charging.settings.is_none());
    }

    #[test]
    fn test_numeric_fields_tolerate_strings_and_floats() {
        let doc = json!({
            "charging": {
                "chargingStatus": {"value": {
                    "chargingState": "charging",
                    "chargePower_kW": "7.4"
                }},
                "chargingSettings": {"value": {"targetSOC_pct": 80.0}},
                "batteryStatus": {"value": {"currentSOC_pct": "55"}}
            }
        });
        let charging = charging_domain(&doc, true).unwrap();
        assert_eq!(charging.status.unwrap().charge_power_kw, Some(7.4));
        assert_eq!(charging.settings.unwrap().target_soc_pct, Some(80));
        assert_eq!(charging.battery.unwrap().current_soc_pct, Some(55));
    }

    #[test]
    fn test_garbage_numbers_become_none() {
        let doc = json!({
            "charging": {
                "chargingStatus": {"value": {
                    "chargingState": "charging",
                    "chargePower_kW": "unsupported",
                    "chargeRate_kmph": null
                }}
            }
        });
        let status = charging_domain(&doc, false).unwrap().status.unwrap();
        assert_eq!(status.charge_power_kw, None);
        assert_eq!(status.charge_rate_kmph, None);
    }

    #[test]
    fn test_unknown_labels_map_to_unknown() {
        let doc = json!({
            "charging": {
                "chargingStatus": {"value": {"chargingState": "somethingNew"}},
                "plugStatus": {"value": {"plugConnectionState": "invalid"}}
            }
        });
        let charging = charging_domain(&doc, false).unwrap();
        assert_eq!(charging.status.unwrap().state, ChargingState::Unknown);
        assert_eq!(
            charging.plug.unwrap().connection_state,
            PlugConnectionState::Unknown
        );
    }

    #[test]
    fn test_value_container_unwraps_exactly_one_level() {
        // The report payload itself may contain a field named "value";
        // only the outer container is stripped.
        let doc = json!({
            "measurements": {
                "odometerStatus": {"value": {"odometer": {"value": 99}}}
            }
        });
        // The inner object is not silently unwrapped into a number
        assert_eq!(measurements_domain(&doc).unwrap().odometer_km, None);

        let missing_container = json!({
            "measurements": {
                "odometerStatus": {"odometer": 99}
            }
        });
        assert!(measurements_domain(&missing_container).is_none());
    }

    #[test]
    fn test_parking_requires_coordinates() {
        let doc = json!({
            "parking": {
                "parkingPosition": {"value": {"lat": 52.0}}
            }
        });
        assert!(parking_domain(&doc).is_none());
    }

    #[test]
    fn test_garage_listing() {
        let doc = json!({
            "vehicles": [
                {
                    "vin": "VIN1",
                    "model": "Formentor VZ",
                    "nickname": "Daily",
                    "capabilities": [{"id": "charging"}, {"id": "climatisation"}]
                },
                {"nickname": "no-vin-entry"},
                {"vin": "VIN2"}
            ]
        });
        let vehicles = garage_vehicles(&doc);
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].vin, "VIN1");
        assert_eq!(vehicles[0].capabilities, vec!["charging", "climatisation"]);
        assert_eq!(vehicles[1].vin, "VIN2");
        assert!(vehicles[1].capabilities.is_empty());
        assert!(vehicles[1].model.is_none());

        assert!(garage_vehicles(&json!({})).is_empty());
    }
}
