//! Runtime validation of unstructured input against the Data Model shapes.
//!
//! Each `validate_*` function takes a `serde_json::Value` and returns the
//! typed record, or a [`ValidationError::Schema`] listing every violated
//! constraint: missing fields, wrong types, numeric ranges, enum membership
//! and unrecognized extra fields (all schemas are closed).
//!
//! Validation is tied to the `validation` cargo feature, which also provides
//! JSON Schema export. Without it every validator fails immediately with
//! [`ValidationError::DependencyMissing`].

mod rules;

use crate::ephemeris::types::{
    EphemerisSettings, GeoLocation, HousePositions, LayerContext, LayerPositions, PlanetPosition,
};
use crate::vedic::VedicOptions;
use rules::Checker;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One violated constraint; `path` is dotted from the validated root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Schema validation is unavailable: build with the `{feature}` feature enabled")]
    DependencyMissing { feature: &'static str },
    #[error("{entity} failed validation: {}", join_violations(.violations))]
    Schema {
        entity: &'static str,
        violations: Vec<Violation>,
    },
}

impl ValidationError {
    /// Violations carried by a schema failure (empty otherwise)
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationError::Schema { violations, .. } => violations,
            ValidationError::DependencyMissing { .. } => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(feature = "validation")]
fn ensure_available() -> Result<(), ValidationError> {
    Ok(())
}

#[cfg(not(feature = "validation"))]
fn ensure_available() -> Result<(), ValidationError> {
    Err(ValidationError::DependencyMissing {
        feature: "validation",
    })
}

/// Whether this build can validate
pub fn is_available() -> bool {
    ensure_available().is_ok()
}

fn run<T>(
    entity: &'static str,
    value: &Value,
    check: fn(&mut Checker, &str, &Value) -> Option<T>,
) -> Result<T, ValidationError> {
    ensure_available()?;
    let mut checker = Checker::default();
    let parsed = check(&mut checker, "", value);
    let violations = checker.into_violations();
    match parsed {
        Some(record) if violations.is_empty() => Ok(record),
        _ => Err(ValidationError::Schema { entity, violations }),
    }
}

pub fn validate_geo_location(value: &Value) -> Result<GeoLocation, ValidationError> {
    run("GeoLocation", value, rules::geo_location)
}

pub fn validate_planet_position(value: &Value) -> Result<PlanetPosition, ValidationError> {
    run("PlanetPosition", value, rules::planet_position)
}

pub fn validate_house_positions(value: &Value) -> Result<HousePositions, ValidationError> {
    run("HousePositions", value, rules::house_positions)
}

pub fn validate_vedic_options(value: &Value) -> Result<VedicOptions, ValidationError> {
    run("VedicOptions", value, rules::vedic_options)
}

pub fn validate_ephemeris_settings(value: &Value) -> Result<EphemerisSettings, ValidationError> {
    run("EphemerisSettings", value, rules::ephemeris_settings)
}

pub fn validate_layer_positions(value: &Value) -> Result<LayerPositions, ValidationError> {
    run("LayerPositions", value, rules::layer_positions)
}

pub fn validate_layer_context(value: &Value) -> Result<LayerContext, ValidationError> {
    run("LayerContext", value, rules::layer_context)
}

/// JSON Schema describing a Data Model record
#[cfg(feature = "validation")]
pub fn json_schema<T: schemars::JsonSchema>() -> schemars::schema::RootSchema {
    schemars::schema_for!(T)
}
