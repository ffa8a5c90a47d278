#![no_main]
use libfuzzer_sys::fuzz_target;

use formentor::weconnect::decode::{GarageVehicle, garage_vehicles, vehicle_snapshot};

fuzz_target!(|data: &[u8]| {
    // Any byte soup that parses as JSON must decode without panicking
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let fetched_at = chrono::Utc::now();

    for entry in garage_vehicles(&doc) {
        let _ = vehicle_snapshot(&entry, &doc, fetched_at);
    }

    // Also run the same document through a fixed garage entry so status
    // decoding is exercised even when the listing shape is absent
    let entry = GarageVehicle {
        vin: "FUZZ00000000VIN00".to_string(),
        model: None,
        nickname: None,
        capabilities: vec!["charging".to_string(), "climatisation".to_string()],
    };
    let _ = vehicle_snapshot(&entry, &doc, fetched_at);
});
