//! Service layer over ephemeris adapters.
//!
//! A service gives callers a stable entry point (`get_positions`,
//! `get_positions_for_context`) in front of whichever backend does the math.
//! The caching variant consults a [`CacheProvider`] before delegating.
//! Calls are synchronous and run to completion; concurrent misses on the same
//! key may both reach the adapter.

pub mod cache;

pub use cache::{default_cache_key, CacheKeyFn, CacheProvider, InMemoryCacheProvider};

use crate::config::ServiceConfig;
use crate::ephemeris::adapter::{EphemerisAdapter, EphemerisError};
use crate::ephemeris::types::{EphemerisSettings, GeoLocation, LayerContext, LayerPositions};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while constructing a service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("cache must be provided when caching is enabled")]
    MissingCacheProvider,
}

pub trait EphemerisService {
    /// Get ephemeris positions for a given datetime and location
    fn get_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError>;

    /// Get ephemeris positions from a LayerContext
    fn get_positions_for_context(
        &mut self,
        context: &LayerContext,
    ) -> Result<LayerPositions, EphemerisError> {
        self.get_positions(context.datetime, context.location, &context.settings)
    }
}

impl<S: EphemerisService + ?Sized> EphemerisService for Box<S> {
    fn get_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        (**self).get_positions(dt_utc, location, settings)
    }

    fn get_positions_for_context(
        &mut self,
        context: &LayerContext,
    ) -> Result<LayerPositions, EphemerisError> {
        (**self).get_positions_for_context(context)
    }
}

/// Service that delegates every call straight to its adapter
pub struct BaseEphemerisService<A> {
    adapter: A,
}

impl<A: EphemerisAdapter> BaseEphemerisService<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }
}

impl<A: EphemerisAdapter> EphemerisService for BaseEphemerisService<A> {
    fn get_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        log::trace!("Delegating calc_positions for {} to adapter", dt_utc);
        self.adapter.calc_positions(dt_utc, location, settings)
    }
}

/// Service that checks a [`CacheProvider`] before calling the adapter.
///
/// Hits are returned verbatim; staleness is the provider's concern. Misses
/// are computed, stored under the derived key, and returned. Adapter failures
/// are never cached.
pub struct CachedEphemerisService<A> {
    inner: BaseEphemerisService<A>,
    cache: Arc<dyn CacheProvider>,
    key_fn: CacheKeyFn,
}

impl<A: EphemerisAdapter> CachedEphemerisService<A> {
    pub fn new(adapter: A, cache: Arc<dyn CacheProvider>) -> Self {
        Self {
            inner: BaseEphemerisService::new(adapter),
            cache,
            key_fn: Box::new(default_cache_key),
        }
    }

    /// Replace the cache key derivation
    pub fn with_key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(DateTime<Utc>, Option<&GeoLocation>, &EphemerisSettings) -> String
            + Send
            + Sync
            + 'static,
    {
        self.key_fn = Box::new(key_fn);
        self
    }

    pub fn cache(&self) -> &Arc<dyn CacheProvider> {
        &self.cache
    }

    pub fn adapter(&self) -> &A {
        self.inner.adapter()
    }

    /// Key this service would use for the given inputs
    pub fn cache_key(
        &self,
        dt_utc: DateTime<Utc>,
        location: Option<&GeoLocation>,
        settings: &EphemerisSettings,
    ) -> String {
        (self.key_fn)(dt_utc, location, settings)
    }

    pub fn clear_cache(&self) {
        log::debug!("Clearing ephemeris cache");
        self.cache.clear();
    }
}

impl<A: EphemerisAdapter> EphemerisService for CachedEphemerisService<A> {
    fn get_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        let key = self.cache_key(dt_utc, location.as_ref(), settings);
        if let Some(cached) = self.cache.get(&key) {
            log::debug!("Ephemeris cache hit: {}", key);
            return Ok(cached);
        }

        log::debug!("Ephemeris cache miss: {}", key);
        let positions = self.inner.get_positions(dt_utc, location, settings)?;
        self.cache.set(&key, positions.clone());
        log::debug!("Stored positions under {}", key);
        Ok(positions)
    }
}

/// Build a plain or caching service.
///
/// Caching requires a provider; asking for it without one fails before any
/// calculation runs.
pub fn create_ephemeris_service<A>(
    adapter: A,
    enable_cache: bool,
    cache: Option<Arc<dyn CacheProvider>>,
) -> Result<Box<dyn EphemerisService>, ServiceError>
where
    A: EphemerisAdapter + 'static,
{
    if enable_cache {
        let cache = cache.ok_or(ServiceError::MissingCacheProvider)?;
        return Ok(Box::new(CachedEphemerisService::new(adapter, cache)));
    }
    Ok(Box::new(BaseEphemerisService::new(adapter)))
}

/// Build a service according to a loaded [`ServiceConfig`]
pub fn create_service_from_config<A>(
    adapter: A,
    config: &ServiceConfig,
    cache: Option<Arc<dyn CacheProvider>>,
) -> Result<Box<dyn EphemerisService>, ServiceError>
where
    A: EphemerisAdapter + 'static,
{
    create_ephemeris_service(adapter, config.enable_cache, cache)
}
