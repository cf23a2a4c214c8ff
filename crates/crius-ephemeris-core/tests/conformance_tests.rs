use chrono::{DateTime, TimeZone, Utc};
use crius_ephemeris_core::ephemeris::{
    EphemerisAdapter, EphemerisError, EphemerisSettings, GeoLocation, HousePositions,
    JsonEphemerisBackend, LayerPositions, PlanetPosition,
};
use crius_ephemeris_core::testing::{
    create_test_adapter, ensure_conformant, verify_adapter_protocol, verify_adapter_runtime,
    verify_adapter_signature, verify_backend_runtime, verify_positions_value,
    verify_signature_manifest, AdapterSignature, MockEphemerisAdapter, ParameterSignature,
    RuntimeProbe,
};
use serde_json::{json, Value};
use std::collections::HashMap;

fn sun() -> PlanetPosition {
    PlanetPosition {
        lon: 280.5,
        lat: 0.0,
        speed_lon: 1.0,
        retrograde: false,
    }
}

fn full_houses() -> HousePositions {
    HousePositions {
        system: "placidus".to_string(),
        cusps: HashMap::from([("1".to_string(), 15.0), ("2".to_string(), 45.0)]),
        angles: HashMap::from([
            ("asc".to_string(), 15.0),
            ("mc".to_string(), 105.0),
            ("ic".to_string(), 285.0),
            ("dc".to_string(), 195.0),
        ]),
    }
}

fn probe(location: Option<GeoLocation>) -> RuntimeProbe {
    RuntimeProbe {
        dt_utc: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        location,
        settings: EphemerisSettings::default(),
    }
}

struct JsonBackend {
    payload: Value,
}

impl JsonEphemerisBackend for JsonBackend {
    fn calc_positions_json(
        &mut self,
        _dt_utc: DateTime<Utc>,
        _location: Option<GeoLocation>,
        _settings: &EphemerisSettings,
    ) -> Result<Value, EphemerisError> {
        Ok(self.payload.clone())
    }
}

struct PanickingAdapter;

impl EphemerisAdapter for PanickingAdapter {
    fn calc_positions(
        &mut self,
        _dt_utc: DateTime<Utc>,
        _location: Option<GeoLocation>,
        _settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        panic!("ephemeris tables not loaded");
    }
}

#[test]
fn test_mock_adapter_conforms() {
    let mut adapter = create_test_adapter(HashMap::from([("sun".to_string(), sun())]), None);
    assert!(verify_adapter_runtime(&mut adapter, None).is_empty());
    assert_eq!(adapter.call_count(), 1);
    assert_eq!(adapter.last_call().unwrap().settings, EphemerisSettings::default());
}

#[test]
fn test_mock_adapter_with_houses_and_location() {
    let mut adapter =
        create_test_adapter(HashMap::from([("sun".to_string(), sun())]), Some(full_houses()));
    let errors = verify_adapter_runtime(
        &mut adapter,
        Some(probe(Some(GeoLocation::new(40.7128, -74.006)))),
    );
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_houses_without_location_is_flagged() {
    let mut adapter = create_test_adapter(HashMap::new(), Some(full_houses()));
    let errors = verify_adapter_runtime(&mut adapter, Some(probe(None)));
    assert_eq!(
        errors,
        vec!["'houses' must be null when no location is supplied".to_string()]
    );
}

#[test]
fn test_contract_violations_in_typed_output() {
    let mut houses = full_houses();
    houses.angles.remove("dc");
    let mut adapter = create_test_adapter(
        HashMap::from([(
            "moon".to_string(),
            PlanetPosition {
                lon: 360.0,
                lat: 0.0,
                speed_lon: 13.0,
                retrograde: false,
            },
        )]),
        Some(houses),
    );
    let errors = verify_adapter_runtime(
        &mut adapter,
        Some(probe(Some(GeoLocation::new(0.0, 0.0)))),
    );
    assert_eq!(
        errors,
        vec![
            "Planet 'moon' longitude 360 is outside [0, 360)".to_string(),
            "House positions missing angle 'dc'".to_string(),
        ]
    );
}

#[test]
fn test_adapter_error_is_reported_not_raised() {
    let mut adapter = MockEphemerisAdapter::failing(EphemerisError::FileNotFound {
        path: "/usr/local/share/swisseph".to_string(),
        message: "missing".to_string(),
    });
    let errors = verify_adapter_runtime(&mut adapter, None);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Runtime error calling calc_positions:"));
    assert!(errors[0].contains("/usr/local/share/swisseph"));
}

#[test]
fn test_adapter_panic_is_captured() {
    let errors = verify_adapter_runtime(&mut PanickingAdapter, None);
    assert_eq!(
        errors,
        vec!["Runtime error calling calc_positions: panicked: ephemeris tables not loaded"
            .to_string()]
    );
}

#[test]
fn test_backend_missing_retrograde_is_named() {
    let mut backend = JsonBackend {
        payload: json!({
            "planets": { "sun": { "lon": 280.5, "lat": 0.0, "speed_lon": 1.0 } },
            "houses": null
        }),
    };
    let errors = verify_backend_runtime(&mut backend, None);
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("'retrograde'")));
}

#[test]
fn test_backend_houses_shape() {
    let mut backend = JsonBackend {
        payload: json!({
            "planets": {},
            "houses": { "system": "placidus", "cusps": {} }
        }),
    };
    let errors = verify_backend_runtime(&mut backend, Some(probe(Some(GeoLocation::new(1.0, 1.0)))));
    assert_eq!(errors, vec!["House positions must have 'angles' field".to_string()]);
}

#[test]
fn test_positions_value_shape() {
    assert_eq!(
        verify_positions_value(&json!([])),
        vec!["calc_positions must return a mapping".to_string()]
    );
    assert_eq!(
        verify_positions_value(&json!({})),
        vec![
            "Return value must have 'planets' key".to_string(),
            "Return value must have 'houses' key".to_string(),
        ]
    );
    assert_eq!(
        verify_positions_value(&json!({ "planets": [], "houses": 3 })),
        vec![
            "'planets' must be a mapping".to_string(),
            "'houses' must be a mapping or null".to_string(),
        ]
    );
    assert_eq!(
        verify_positions_value(&json!({ "planets": { "sun": 1 }, "houses": null })),
        vec!["Planet position for 'sun' must be a mapping".to_string()]
    );
}

#[test]
fn test_native_adapter_protocol() {
    assert!(verify_adapter_protocol::<MockEphemerisAdapter>().is_empty());
    assert!(verify_adapter_signature(&AdapterSignature::canonical()).is_empty());
}

#[test]
fn test_signature_accepts_qualified_types() {
    let signature = AdapterSignature {
        method: "calc_positions".to_string(),
        parameters: vec![
            ParameterSignature {
                name: "datetime".to_string(),
                type_name: Some("chrono::DateTime<chrono::Utc>".to_string()),
            },
            ParameterSignature {
                name: "location".to_string(),
                type_name: None,
            },
            ParameterSignature {
                name: "settings".to_string(),
                type_name: Some("&crius_ephemeris_core::EphemerisSettings".to_string()),
            },
        ],
        return_type: Some("LayerPositions".to_string()),
    };
    assert!(verify_adapter_signature(&signature).is_empty());
}

#[test]
fn test_signature_collects_every_mismatch() {
    let errors = verify_signature_manifest(&json!({
        "method": "calc_positions",
        "parameters": [
            { "name": "dt_utc", "type_name": "String" },
            { "name": "settings", "type_name": "HashMap<String, String>" }
        ],
        "return_type": "Vec<PlanetPosition>"
    }));
    assert_eq!(
        errors,
        vec![
            "calc_positions 'dt_utc' parameter must be DateTime<Utc>, got String".to_string(),
            "calc_positions must have 'location' parameter".to_string(),
            "calc_positions 'settings' parameter must be EphemerisSettings, got HashMap<String, String>"
                .to_string(),
            "calc_positions must return LayerPositions, got Vec<PlanetPosition>".to_string(),
        ]
    );
}

#[test]
fn test_signature_wrong_method() {
    let errors = verify_signature_manifest(&json!({
        "method": "compute",
        "parameters": []
    }));
    assert_eq!(errors, vec!["Adapter must have 'calc_positions' method".to_string()]);
}

#[test]
fn test_malformed_manifest_is_reported() {
    let errors = verify_signature_manifest(&json!({ "parameters": "dt_utc" }));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Error checking method signature:"));
}

#[test]
fn test_ensure_conformant_wraps_errors() {
    let mut backend = JsonBackend {
        payload: json!({ "planets": {} }),
    };
    let err = ensure_conformant(verify_backend_runtime(&mut backend, None)).unwrap_err();
    assert_eq!(err.errors, vec!["Return value must have 'houses' key".to_string()]);
}

#[test]
fn test_mock_reset() {
    let mut adapter = MockEphemerisAdapter::new();
    adapter
        .calc_positions(Utc::now(), None, &EphemerisSettings::default())
        .unwrap();
    assert_eq!(adapter.call_count(), 1);
    adapter.reset();
    assert_eq!(adapter.call_count(), 0);
    assert!(adapter.last_call().is_none());
}
