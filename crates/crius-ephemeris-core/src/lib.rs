//! Crius ephemeris core: shared data contracts for ephemeris calculations.
//!
//! This crate holds no astronomy. It defines the records exchanged between
//! callers and backends, the [`EphemerisAdapter`] capability a backend
//! implements, a service layer with optional caching, runtime validation of
//! unstructured input, and conformance helpers for testing backends.

pub mod config;
pub mod ephemeris;
pub mod service;
pub mod testing;
pub mod validation;
pub mod vedic;

pub use config::{ConfigError, ServiceConfig};
pub use ephemeris::{
    EphemerisAdapter, EphemerisError, EphemerisSettings, GeoLocation, HousePositions,
    JsonAdapter, JsonEphemerisBackend, LayerContext, LayerPositions, PlanetPosition, ZodiacType,
};
pub use service::{
    create_ephemeris_service, create_service_from_config, BaseEphemerisService, CacheProvider,
    CachedEphemerisService, EphemerisService, InMemoryCacheProvider, ServiceError,
};
pub use vedic::{DashaLevel, VedicOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
