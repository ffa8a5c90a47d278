//! Entity rendering for fully equipped and sparsely equipped vehicles

mod common;

use common::{HYBRID_VIN, ev_snapshot, hybrid_snapshot};
use formentor::entities::{
    BinarySensorState, SensorState, vehicle_entities,
};
use serde_json::json;

fn sensor<'a>(sensors: &'a [SensorState], key: &str) -> &'a SensorState {
    sensors
        .iter()
        .find(|s| s.unique_id.ends_with(&format!("-{}", key)))
        .unwrap_or_else(|| panic!("no sensor with key {}", key))
}

fn binary<'a>(sensors: &'a [BinarySensorState], key: &str) -> &'a BinarySensorState {
    sensors
        .iter()
        .find(|s| s.unique_id.ends_with(&format!("-{}", key)))
        .unwrap_or_else(|| panic!("no binary sensor with key {}", key))
}

#[test]
fn full_ev_renders_every_platform() {
    let entities = vehicle_entities(&ev_snapshot());

    assert_eq!(entities.display_name, "Schnucki");
    assert!(entities.sensors.iter().all(|s| s.available));
    assert!(entities.binary_sensors.iter().all(|s| s.available));
    assert!(entities.numbers.iter().all(|n| n.available));

    assert_eq!(sensor(&entities.sensors, "chargingState").state, json!("charging"));
    assert_eq!(sensor(&entities.sensors, "chargePower_kW").state, json!(7.2));
    assert_eq!(sensor(&entities.sensors, "currentSOC_pct").state, json!(55));
    assert_eq!(
        sensor(&entities.sensors, "cruisingRangeElectric_km").state,
        json!(210)
    );
    assert_eq!(sensor(&entities.sensors, "odometer_km").state, json!(12431));
    assert_eq!(
        sensor(&entities.sensors, "climatisationState").state,
        json!("heating")
    );
    assert_eq!(
        sensor(&entities.sensors, "remainingChargingTime").state,
        json!(95)
    );

    let tracker = entities.device_tracker.expect("EV parks somewhere");
    assert_eq!(tracker.name, "Schnucki Parking Position");
    assert!((tracker.latitude - 52.3061).abs() < 1e-9);
    assert!((tracker.longitude - 5.0419).abs() < 1e-9);
}

#[test]
fn binary_sensor_on_states_follow_vendor_labels() {
    let entities = vehicle_entities(&ev_snapshot());
    let sensors = &entities.binary_sensors;

    assert_eq!(binary(sensors, "plugConnectionState").is_on, Some(true));
    // Doors are locked, and the lock class reports "on" for unlocked
    assert_eq!(binary(sensors, "doorLockStatus").is_on, Some(false));
    assert_eq!(binary(sensors, "isOnline").is_on, Some(true));
    assert_eq!(binary(sensors, "engineStatus").is_on, Some(false));
    assert_eq!(binary(sensors, "lightsStatus").is_on, Some(false));
    // Front window heating is on, rear off
    assert_eq!(binary(sensors, "windowHeating").is_on, Some(true));
}

#[test]
fn hybrid_renders_missing_fields_as_unavailable() {
    let entities = vehicle_entities(&hybrid_snapshot());

    // Nickname missing: the VIN carries the display name
    assert_eq!(entities.display_name, HYBRID_VIN);
    assert_eq!(
        sensor(&entities.sensors, "odometer_km").name,
        format!("{} Odometer", HYBRID_VIN)
    );

    let charging_state = sensor(&entities.sensors, "chargingState");
    assert!(charging_state.available);
    assert_eq!(charging_state.state, json!("readyForCharging"));

    for key in [
        "chargePower_kW",
        "currentSOC_pct",
        "cruisingRangeElectric_km",
        "remainingChargingTime",
        "climatisationState",
        "remainingClimatisationTime",
    ] {
        let s = sensor(&entities.sensors, key);
        assert!(!s.available, "{} should be unavailable", key);
        assert!(s.state.is_null());
    }

    assert_eq!(
        binary(&entities.binary_sensors, "plugConnectionState").is_on,
        Some(false)
    );
    assert_eq!(
        binary(&entities.binary_sensors, "doorLockStatus").is_on,
        Some(true)
    );
    assert_eq!(binary(&entities.binary_sensors, "isOnline").is_on, Some(false));
    let window_heating = binary(&entities.binary_sensors, "windowHeating");
    assert!(!window_heating.available);
    assert_eq!(window_heating.is_on, None);

    assert!(entities.numbers.iter().all(|n| !n.available));
    assert!(entities.device_tracker.is_none());
}

#[test]
fn number_controls_carry_range_metadata() {
    let entities = vehicle_entities(&ev_snapshot());

    let soc = entities
        .numbers
        .iter()
        .find(|n| n.key == "target_state_of_charge")
        .unwrap();
    assert_eq!(soc.value, Some(80.0));
    assert_eq!((soc.min, soc.max, soc.step), (10.0, 100.0, 10.0));
    assert_eq!(soc.unit, "%");

    let temperature = entities
        .numbers
        .iter()
        .find(|n| n.key == "target_climate_temperature")
        .unwrap();
    assert_eq!(temperature.value, Some(21.5));
    assert_eq!(
        (temperature.min, temperature.max, temperature.step),
        (10.0, 30.0, 0.5)
    );
    assert_eq!(temperature.unit, "°C");
}

#[test]
fn buttons_are_always_listed() {
    let ev = vehicle_entities(&ev_snapshot());
    let hybrid = vehicle_entities(&hybrid_snapshot());

    let keys: Vec<&str> = ev.buttons.iter().map(|b| b.key).collect();
    assert_eq!(
        keys,
        vec![
            "start_climate",
            "stop_climate",
            "start_charging",
            "stop_charging",
            "toggle_ac_charge_speed",
        ]
    );
    // Presence does not depend on capability; presses resolve per dispatcher
    assert_eq!(hybrid.buttons.len(), 5);
}

#[test]
fn serialized_entities_omit_empty_fields() {
    let value = serde_json::to_value(vehicle_entities(&hybrid_snapshot())).unwrap();

    assert!(value.get("device_tracker").is_none());

    let sensors = value["sensors"].as_array().unwrap();
    let charging_state = sensors
        .iter()
        .find(|s| s["unique_id"].as_str().unwrap().ends_with("-chargingState"))
        .unwrap();
    // No unit configured for the state sensor, so the key is absent
    assert!(charging_state.get("unit").is_none());
    assert_eq!(charging_state["available"], json!(true));
}
