//! Conformance checks for adapter implementations.
//!
//! Native Rust adapters are held to the contract by the [`EphemerisAdapter`]
//! trait itself. Plug-in backends declare their entry point as an
//! [`AdapterSignature`] and report results as JSON, so both their declared
//! shape and their runtime output are checked here. Every check returns a
//! list of messages (empty when conformant) instead of failing fast.

use crate::ephemeris::adapter::{EphemerisAdapter, EphemerisError, JsonEphemerisBackend};
use crate::ephemeris::types::{
    EphemerisSettings, GeoLocation, LayerPositions, ANGLE_LABELS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

const PLANET_FIELDS: [&str; 4] = ["lon", "lat", "speed_lon", "retrograde"];
const HOUSE_FIELDS: [&str; 3] = ["system", "cusps", "angles"];

/// Raised when an adapter does not conform to the protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}: {}", errors.join("; "))]
pub struct ProtocolConformanceError {
    pub message: String,
    pub errors: Vec<String>,
}

/// Turn a list of check messages into a result
pub fn ensure_conformant(errors: Vec<String>) -> Result<(), ProtocolConformanceError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ProtocolConformanceError {
        message: format!("Adapter failed {} conformance check(s)", errors.len()),
        errors,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSignature {
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
}

/// Declared shape of a backend's calculation entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSignature {
    pub method: String,
    pub parameters: Vec<ParameterSignature>,
    #[serde(default)]
    pub return_type: Option<String>,
}

impl AdapterSignature {
    /// Signature of [`EphemerisAdapter::calc_positions`]
    pub fn canonical() -> Self {
        let param = |name: &str, type_name: &str| ParameterSignature {
            name: name.to_string(),
            type_name: Some(type_name.to_string()),
        };
        Self {
            method: "calc_positions".to_string(),
            parameters: vec![
                param("dt_utc", "DateTime<Utc>"),
                param("location", "Option<GeoLocation>"),
                param("settings", "&EphemerisSettings"),
            ],
            return_type: Some("Result<LayerPositions, EphemerisError>".to_string()),
        }
    }
}

struct ExpectedParam {
    name: &'static str,
    aliases: &'static [&'static str],
    display_type: &'static str,
    accepted: &'static [&'static str],
}

const EXPECTED_PARAMS: [ExpectedParam; 3] = [
    ExpectedParam {
        name: "dt_utc",
        aliases: &["dt_utc", "datetime", "dt"],
        display_type: "DateTime<Utc>",
        accepted: &["DateTime<Utc>"],
    },
    ExpectedParam {
        name: "location",
        aliases: &["location"],
        display_type: "Option<GeoLocation>",
        accepted: &["Option<GeoLocation>"],
    },
    ExpectedParam {
        name: "settings",
        aliases: &["settings"],
        display_type: "EphemerisSettings",
        accepted: &["EphemerisSettings"],
    },
];

const ACCEPTED_RETURNS: [&str; 2] = ["LayerPositions", "Result<LayerPositions,EphemerisError>"];

/// Reduce a type name to a comparable form: no whitespace, references,
/// lifetimes or module paths
fn normalize_type(raw: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        if ch.is_alphanumeric() || ch == '_' || ch == '\'' {
            let mut token = ch.to_string();
            while let Some(&next) = chars.peek() {
                if !(next.is_alphanumeric() || next == '_') {
                    break;
                }
                token.push(next);
                chars.next();
            }
            tokens.push(token);
        } else if ch == ':' && chars.peek() == Some(&':') {
            chars.next();
            tokens.push("::".to_string());
        } else {
            tokens.push(ch.to_string());
        }
    }

    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        let path_prefix = tokens.get(i + 1).is_some_and(|next| next == "::");
        let dropped = token == "::" || token == "&" || token == "mut" || token.starts_with('\'');
        if path_prefix || dropped {
            continue;
        }
        out.push_str(token);
    }
    out
}

/// Check a declared signature against the adapter contract
pub fn verify_adapter_signature(signature: &AdapterSignature) -> Vec<String> {
    let mut errors = Vec::new();

    if signature.method != "calc_positions" {
        errors.push("Adapter must have 'calc_positions' method".to_string());
        return errors;
    }

    for expected in &EXPECTED_PARAMS {
        let declared = signature
            .parameters
            .iter()
            .find(|p| expected.aliases.contains(&p.name.as_str()));
        let Some(declared) = declared else {
            errors.push(format!(
                "calc_positions must have '{}' parameter",
                expected.name
            ));
            continue;
        };
        if let Some(type_name) = &declared.type_name {
            if !expected.accepted.contains(&normalize_type(type_name).as_str()) {
                errors.push(format!(
                    "calc_positions '{}' parameter must be {}, got {}",
                    expected.name, expected.display_type, type_name
                ));
            }
        }
    }

    if let Some(return_type) = &signature.return_type {
        if !ACCEPTED_RETURNS.contains(&normalize_type(return_type).as_str()) {
            errors.push(format!(
                "calc_positions must return LayerPositions, got {}",
                return_type
            ));
        }
    }

    errors
}

/// Check a plug-in manifest describing the entry point as JSON
pub fn verify_signature_manifest(manifest: &Value) -> Vec<String> {
    match AdapterSignature::deserialize(manifest) {
        Ok(signature) => verify_adapter_signature(&signature),
        Err(e) => vec![format!("Error checking method signature: {}", e)],
    }
}

/// Static check for native adapters.
///
/// The trait bound already proves conformance; the canonical signature is
/// checked so the result is comparable with plug-in checks.
pub fn verify_adapter_protocol<A: EphemerisAdapter + ?Sized>() -> Vec<String> {
    verify_adapter_signature(&AdapterSignature::canonical())
}

/// Inputs used to exercise a candidate at runtime
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeProbe {
    pub dt_utc: DateTime<Utc>,
    pub location: Option<GeoLocation>,
    pub settings: EphemerisSettings,
}

impl Default for RuntimeProbe {
    fn default() -> Self {
        Self {
            dt_utc: Utc::now(),
            location: None,
            settings: EphemerisSettings::default(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run one call, turning failures and panics into a message
fn probe_call<T>(call: impl FnOnce() -> Result<T, EphemerisError>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("Runtime error calling calc_positions: {}", e)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("calc_positions panicked during conformance check: {}", message);
            Err(format!(
                "Runtime error calling calc_positions: panicked: {}",
                message
            ))
        }
    }
}

/// Shape check of a positions payload using the Data Model's field names
pub fn verify_positions_value(result: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(map) = result.as_object() else {
        errors.push("calc_positions must return a mapping".to_string());
        return errors;
    };

    if !map.contains_key("planets") {
        errors.push("Return value must have 'planets' key".to_string());
    }
    if !map.contains_key("houses") {
        errors.push("Return value must have 'houses' key".to_string());
    }

    if let Some(planets) = map.get("planets") {
        match planets.as_object() {
            None => errors.push("'planets' must be a mapping".to_string()),
            Some(planets) => {
                for (planet_id, position) in planets {
                    let Some(position) = position.as_object() else {
                        errors.push(format!(
                            "Planet position for '{}' must be a mapping",
                            planet_id
                        ));
                        continue;
                    };
                    for field in PLANET_FIELDS {
                        if !position.contains_key(field) {
                            errors.push(format!(
                                "Planet position for '{}' must have '{}' field",
                                planet_id, field
                            ));
                        }
                    }
                }
            }
        }
    }

    match map.get("houses") {
        None | Some(Value::Null) => {}
        Some(Value::Object(houses)) => {
            for field in HOUSE_FIELDS {
                if !houses.contains_key(field) {
                    errors.push(format!("House positions must have '{}' field", field));
                }
            }
        }
        Some(_) => errors.push("'houses' must be a mapping or null".to_string()),
    }

    errors
}

fn houses_without_location(location: Option<&GeoLocation>, has_houses: bool) -> Option<String> {
    (location.is_none() && has_houses)
        .then(|| "'houses' must be null when no location is supplied".to_string())
}

fn verify_positions_contract(positions: &LayerPositions, probe: &RuntimeProbe) -> Vec<String> {
    let mut errors = Vec::new();
    errors.extend(houses_without_location(
        probe.location.as_ref(),
        positions.houses.is_some(),
    ));

    let mut planet_ids: Vec<&String> = positions.planets.keys().collect();
    planet_ids.sort();
    for planet_id in planet_ids {
        let lon = positions.planets[planet_id].lon;
        if !(0.0..360.0).contains(&lon) {
            errors.push(format!(
                "Planet '{}' longitude {} is outside [0, 360)",
                planet_id, lon
            ));
        }
    }

    if let Some(houses) = &positions.houses {
        for label in ANGLE_LABELS {
            if houses.angle(label).is_none() {
                errors.push(format!("House positions missing angle '{}'", label));
            }
        }
    }

    errors
}

/// Exercise a native adapter and check what it returns.
///
/// `probe` defaults to "now", no location and [`EphemerisSettings::default`].
pub fn verify_adapter_runtime<A: EphemerisAdapter + ?Sized>(
    adapter: &mut A,
    probe: Option<RuntimeProbe>,
) -> Vec<String> {
    let probe = probe.unwrap_or_default();
    let positions = match probe_call(|| {
        adapter.calc_positions(probe.dt_utc, probe.location, &probe.settings)
    }) {
        Ok(positions) => positions,
        Err(message) => return vec![message],
    };

    let mut errors = match serde_json::to_value(&positions) {
        Ok(value) => verify_positions_value(&value),
        Err(e) => vec![format!("Runtime error serializing positions: {}", e)],
    };
    errors.extend(verify_positions_contract(&positions, &probe));
    errors
}

/// Exercise a JSON plug-in backend and check the raw payload it returns
pub fn verify_backend_runtime<B: JsonEphemerisBackend + ?Sized>(
    backend: &mut B,
    probe: Option<RuntimeProbe>,
) -> Vec<String> {
    let probe = probe.unwrap_or_default();
    let value = match probe_call(|| {
        backend.calc_positions_json(probe.dt_utc, probe.location, &probe.settings)
    }) {
        Ok(value) => value,
        Err(message) => return vec![message],
    };

    let mut errors = verify_positions_value(&value);
    let has_houses = value.get("houses").is_some_and(|h| !h.is_null());
    errors.extend(houses_without_location(probe.location.as_ref(), has_houses));
    errors
}
