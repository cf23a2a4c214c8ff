#![cfg(feature = "validation")]

use chrono::{TimeZone, Utc};
use crius_ephemeris_core::ephemeris::{GeoLocation, LayerPositions, ZodiacType};
use crius_ephemeris_core::validation::{
    json_schema, validate_ephemeris_settings, validate_geo_location, validate_house_positions,
    validate_layer_context, validate_layer_positions, validate_planet_position,
    validate_vedic_options, ValidationError,
};
use crius_ephemeris_core::vedic::DashaLevel;
use serde_json::json;

fn paths(err: &ValidationError) -> Vec<String> {
    err.violations().iter().map(|v| v.path.clone()).collect()
}

#[test]
fn test_valid_locations_pass_unchanged() {
    for (lat, lon) in [
        (0.0, 0.0),
        (40.7128, -74.006),
        (-90.0, 180.0),
        (90.0, -180.0),
        (-33.8688, 151.2093),
    ] {
        let location = validate_geo_location(&json!({ "lat": lat, "lon": lon })).unwrap();
        assert_eq!(location, GeoLocation { lat, lon });
    }
}

#[test]
fn test_integer_coordinates_are_accepted() {
    let location = validate_geo_location(&json!({ "lat": 51, "lon": 0 })).unwrap();
    assert_eq!(location, GeoLocation::new(51.0, 0.0));
}

#[test]
fn test_out_of_range_location_names_field() {
    let err = validate_geo_location(&json!({ "lat": 91.0, "lon": 0.0 })).unwrap_err();
    assert_eq!(paths(&err), vec!["lat"]);

    let err = validate_geo_location(&json!({ "lat": 0.0, "lon": -180.5 })).unwrap_err();
    assert_eq!(paths(&err), vec!["lon"]);
    assert!(err.to_string().contains("lon"));
}

#[test]
fn test_every_violation_is_reported() {
    let err = validate_geo_location(&json!({ "lat": -100.0, "lon": 200.0, "alt": 10 }))
        .unwrap_err();
    let mut found = paths(&err);
    found.sort();
    assert_eq!(found, vec!["alt", "lat", "lon"]);
    match err {
        ValidationError::Schema { entity, .. } => assert_eq!(entity, "GeoLocation"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_and_mistyped_fields() {
    let err = validate_planet_position(&json!({ "lon": "280", "lat": 0.0, "speed_lon": 1.0 }))
        .unwrap_err();
    let mut found = paths(&err);
    found.sort();
    assert_eq!(found, vec!["lon", "retrograde"]);
}

#[test]
fn test_planet_longitude_is_half_open() {
    assert!(validate_planet_position(&json!({
        "lon": 0.0, "lat": 0.0, "speed_lon": 1.0, "retrograde": false
    }))
    .is_ok());

    let err = validate_planet_position(&json!({
        "lon": 360.0, "lat": 0.0, "speed_lon": 1.0, "retrograde": false
    }))
    .unwrap_err();
    assert_eq!(paths(&err), vec!["lon"]);
}

#[test]
fn test_settings_enum_membership() {
    let err = validate_ephemeris_settings(&json!({
        "zodiac_type": "draconic",
        "ayanamsa": null,
        "house_system": "placidus",
        "include_objects": ["sun"]
    }))
    .unwrap_err();
    assert_eq!(paths(&err), vec!["zodiac_type"]);
    assert!(err.to_string().contains("'tropical', 'sidereal'"));
}

#[test]
fn test_settings_normalized() {
    let settings = validate_ephemeris_settings(&json!({
        "zodiac_type": "sidereal",
        "house_system": "whole_sign",
        "include_objects": ["moon", "sun"],
        "vedic_options": { "dashas_depth": "pratyantardasha", "include_yogas": null }
    }))
    .unwrap();

    assert_eq!(settings.zodiac_type, ZodiacType::Sidereal);
    assert_eq!(settings.ayanamsa, None);
    assert_eq!(settings.include_objects, vec!["moon", "sun"]);
    let vedic = settings.vedic_options.unwrap();
    assert_eq!(vedic.dashas_depth, Some(DashaLevel::Pratyantardasha));
    assert_eq!(vedic.include_yogas, None);
}

#[test]
fn test_nested_vedic_violations() {
    let err = validate_ephemeris_settings(&json!({
        "zodiac_type": "tropical",
        "house_system": "placidus",
        "include_objects": ["sun", 7],
        "vedic_options": { "dashas_depth": "sookshma", "include_dashas": "yes", "extra": 1 }
    }))
    .unwrap_err();
    let mut found = paths(&err);
    found.sort();
    assert_eq!(
        found,
        vec![
            "include_objects.1",
            "vedic_options.dashas_depth",
            "vedic_options.extra",
            "vedic_options.include_dashas",
        ]
    );
}

#[test]
fn test_vedic_options_all_optional() {
    let options = validate_vedic_options(&json!({})).unwrap();
    assert!(options.is_empty());

    let options = validate_vedic_options(&json!({
        "include_nakshatras": false,
        "enabled_vargas": ["d9", "d10"],
        "dasha_systems": ["vimshottari"]
    }))
    .unwrap();
    assert_eq!(options.include_nakshatras, Some(false));
    assert_eq!(options.enabled_vargas.unwrap(), vec!["d9", "d10"]);
}

#[test]
fn test_house_positions_require_canonical_angles() {
    let err = validate_house_positions(&json!({
        "system": "placidus",
        "cusps": { "1": 15.0 },
        "angles": { "asc": 15.0, "mc": 105.0 }
    }))
    .unwrap_err();
    assert_eq!(paths(&err), vec!["angles"]);
    assert!(err.to_string().contains("ic, dc"));

    let houses = validate_house_positions(&json!({
        "system": "placidus",
        "cusps": { "1": 15.0, "2": 45.0 },
        "angles": { "asc": 15.0, "mc": 105.0, "ic": 285.0, "dc": 195.0 }
    }))
    .unwrap();
    assert_eq!(houses.cusp(2), Some(45.0));
}

#[test]
fn test_layer_positions_nested_paths() {
    let err = validate_layer_positions(&json!({
        "planets": {
            "sun": { "lon": 280.5, "lat": 0.0, "speed_lon": 1.0 },
            "moon": { "lon": 45.2, "lat": 2.1, "speed_lon": 13.0, "retrograde": false }
        },
        "houses": null
    }))
    .unwrap_err();
    assert_eq!(paths(&err), vec!["planets.sun.retrograde"]);

    let positions = validate_layer_positions(&json!({ "planets": {}, "houses": null })).unwrap();
    assert_eq!(positions, LayerPositions::default());
}

#[test]
fn test_layer_context() {
    let context = validate_layer_context(&json!({
        "layer_id": "natal",
        "kind": "natal",
        "datetime": "2024-01-01T12:00:00Z",
        "location": { "lat": 40.7128, "lon": -74.006 },
        "settings": {
            "zodiac_type": "tropical",
            "ayanamsa": null,
            "house_system": "placidus",
            "include_objects": ["sun"]
        }
    }))
    .unwrap();
    assert_eq!(
        context.datetime,
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    );
    assert_eq!(context.location, Some(GeoLocation::new(40.7128, -74.006)));

    let naive = validate_layer_context(&json!({
        "layer_id": "transit",
        "kind": "transit",
        "datetime": "2024-06-21T08:30:00",
        "settings": {
            "zodiac_type": "tropical",
            "house_system": "placidus",
            "include_objects": []
        }
    }))
    .unwrap();
    assert_eq!(
        naive.datetime,
        Utc.with_ymd_and_hms(2024, 6, 21, 8, 30, 0).unwrap()
    );
    assert_eq!(naive.location, None);
}

#[test]
fn test_layer_context_rejects_non_utc_offset() {
    let err = validate_layer_context(&json!({
        "layer_id": "natal",
        "kind": "natal",
        "datetime": "2024-01-01T12:00:00+05:30",
        "location": { "lat": 95.0, "lon": 0.0 },
        "settings": {
            "zodiac_type": "tropical",
            "house_system": "placidus",
            "include_objects": ["sun"]
        }
    }))
    .unwrap_err();
    let mut found = paths(&err);
    found.sort();
    assert_eq!(found, vec!["datetime", "location.lat"]);
}

#[test]
fn test_non_object_input() {
    let err = validate_geo_location(&json!([1, 2])).unwrap_err();
    assert_eq!(err.violations().len(), 1);
    assert_eq!(err.violations()[0].message, "expected object, got array");
}

#[test]
fn test_json_schema_export() {
    let schema = serde_json::to_value(json_schema::<GeoLocation>()).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    assert!(properties.contains_key("lat"));
    assert!(properties.contains_key("lon"));
}
