// Verify the wire format matches what dashboard clients parse.
// Field names and order must never change.

use dashcast_protocol::telemetry::{EfficiencyStatus, VehicleTelemetry};

const SAMPLE_WIRE: &str =
    r#"{"fuelIn":45.5,"fuelOut":2.3,"gear":3,"rpm":2500,"speed":65,"mileage":14.2}"#;

#[test]
fn sample_serializes_to_reference_wire_text() {
    let json = VehicleTelemetry::sample().to_json().unwrap();
    assert_eq!(json, SAMPLE_WIRE);
}

#[test]
fn exactly_six_fields() {
    let value = serde_json::to_value(VehicleTelemetry::sample()).unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 6);
    for key in ["fuelIn", "fuelOut", "gear", "rpm", "speed", "mileage"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
}

#[test]
fn integer_fields_are_integers() {
    let value = serde_json::to_value(VehicleTelemetry::sample()).unwrap();
    assert!(value["gear"].is_u64());
    assert!(value["rpm"].is_u64());
    assert!(value["speed"].is_u64());
    assert!(value["fuelIn"].is_f64());
    assert!(value["mileage"].is_f64());
}

#[test]
fn parses_client_record_with_timestamp() {
    let json = r#"{"fuelIn":30,"fuelOut":12.5,"gear":5,"rpm":3100,"speed":110,"mileage":16.8,"timestamp":1717000000000}"#;
    let reading = VehicleTelemetry::from_json(json).unwrap();
    assert_eq!(reading.gear, 5);
    assert_eq!(reading.fuel_in, 30.0);
    assert_eq!(reading.efficiency(), EfficiencyStatus::Optimal);
}

#[test]
fn rejects_snake_case_fields() {
    let json = r#"{"fuel_in":1.0,"fuel_out":1.0,"gear":1,"rpm":1,"speed":1,"mileage":1.0}"#;
    let err = VehicleTelemetry::from_json(json).unwrap_err();
    assert_eq!(err.code(), "SERIALIZATION_ERROR");
}

#[test]
fn rejects_negative_gear() {
    let json = r#"{"fuelIn":1.0,"fuelOut":1.0,"gear":-1,"rpm":1,"speed":1,"mileage":1.0}"#;
    assert!(VehicleTelemetry::from_json(json).is_err());
}

#[test]
fn efficiency_status_wire_names() {
    let json = serde_json::to_string(&EfficiencyStatus::Danger).unwrap();
    assert_eq!(json, r#""danger""#);
    assert_eq!(EfficiencyStatus::Optimal.as_str(), "optimal");
}
