use crate::ephemeris::types::{EphemerisSettings, GeoLocation, LayerPositions};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during ephemeris calculations
///
/// Adapters report their failures through this type; services propagate it
/// to their callers unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Ephemeris file not found at path: {path}. {message}")]
    FileNotFound { path: String, message: String },
    #[error("Invalid house system: {system}. Valid systems: {valid:?}")]
    InvalidHouseSystem { system: String, valid: Vec<String> },
    #[error("Invalid ayanamsa: {ayanamsa}. Valid ayanamsas: {valid:?}")]
    InvalidAyanamsa { ayanamsa: String, valid: Vec<String> },
    #[error("Unsupported object: {object_id}")]
    UnsupportedObject { object_id: String },
    #[error("Date {datetime} is outside the supported range: {message}")]
    InvalidDateRange {
        datetime: DateTime<Utc>,
        message: String,
    },
    #[error("Failed to calculate position for {planet_id} at {datetime}: {message}")]
    CalculationFailed {
        planet_id: String,
        datetime: DateTime<Utc>,
        message: String,
    },
    #[error("House calculation failed: {message}")]
    HouseCalculationFailed { message: String },
    #[error("Backend returned malformed positions: {message}")]
    MalformedOutput { message: String },
    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },
}

/// Capability every ephemeris backend provides.
///
/// Implementations must return `houses: None` whenever `location` is `None`,
/// and one planet entry per recognized identifier in
/// `settings.include_objects`. What happens to unrecognized identifiers is up
/// to the backend.
pub trait EphemerisAdapter {
    /// Calculate planetary and house positions
    fn calc_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError>;
}

impl<A: EphemerisAdapter + ?Sized> EphemerisAdapter for Box<A> {
    fn calc_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        (**self).calc_positions(dt_utc, location, settings)
    }
}

impl<A: EphemerisAdapter + ?Sized> EphemerisAdapter for &mut A {
    fn calc_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        (**self).calc_positions(dt_utc, location, settings)
    }
}

/// Plug-in backend that reports positions as raw JSON.
///
/// Out-of-process or foreign backends speak the Data Model's field names
/// verbatim; wrap them in a [`JsonAdapter`] to use them as an
/// [`EphemerisAdapter`].
pub trait JsonEphemerisBackend {
    fn calc_positions_json(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<serde_json::Value, EphemerisError>;
}

/// Decodes the output of a [`JsonEphemerisBackend`] into [`LayerPositions`]
pub struct JsonAdapter<B> {
    backend: B,
}

impl<B: JsonEphemerisBackend> JsonAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl<B: JsonEphemerisBackend> EphemerisAdapter for JsonAdapter<B> {
    fn calc_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        let raw = self.backend.calc_positions_json(dt_utc, location, settings)?;
        serde_json::from_value(raw).map_err(|e| EphemerisError::MalformedOutput {
            message: e.to_string(),
        })
    }
}

impl<B: JsonEphemerisBackend + ?Sized> JsonEphemerisBackend for &mut B {
    fn calc_positions_json(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<serde_json::Value, EphemerisError> {
        (**self).calc_positions_json(dt_utc, location, settings)
    }
}
