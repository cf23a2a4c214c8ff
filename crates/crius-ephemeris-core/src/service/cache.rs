//! Cache provider contract and cache-key derivation for the caching service.

use crate::ephemeris::types::{EphemerisSettings, GeoLocation, LayerPositions};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage for computed positions, keyed by an opaque string.
///
/// The service treats a provider as a black box: eviction, TTL and any
/// locking discipline belong to the implementation.
pub trait CacheProvider: Send + Sync {
    /// Get cached value by key
    fn get(&self, key: &str) -> Option<LayerPositions>;

    /// Store a value under `key`, replacing any previous entry
    fn set(&self, key: &str, value: LayerPositions);

    /// Drop every cached value
    fn clear(&self);
}

/// Derives a cache key from the inputs of one calculation
pub type CacheKeyFn =
    Box<dyn Fn(DateTime<Utc>, Option<&GeoLocation>, &EphemerisSettings) -> String + Send + Sync>;

/// Default cache key.
///
/// Format: `{rfc3339}:{lat},{lon}|None:{zodiac}:{house_system}:{sorted,objects}`,
/// followed by `:ayanamsa={name}` when an ayanamsa is set and
/// `:vedic={json}` when non-empty Vedic options are set. Object order does
/// not affect the key.
pub fn default_cache_key(
    dt_utc: DateTime<Utc>,
    location: Option<&GeoLocation>,
    settings: &EphemerisSettings,
) -> String {
    let location_str = match location {
        Some(loc) => format!("{},{}", loc.lat, loc.lon),
        None => "None".to_string(),
    };

    let mut objects: Vec<&str> = settings.include_objects.iter().map(String::as_str).collect();
    objects.sort_unstable();

    let mut key = format!(
        "{}:{}:{}:{}:{}",
        dt_utc.to_rfc3339(),
        location_str,
        settings.zodiac_type,
        settings.house_system,
        objects.join(",")
    );

    if let Some(ayanamsa) = &settings.ayanamsa {
        key.push_str(":ayanamsa=");
        key.push_str(ayanamsa);
    }

    if let Some(vedic) = settings.vedic_options.as_ref().filter(|v| !v.is_empty()) {
        let canonical = match serde_json::to_string(vedic) {
            Ok(json) => json,
            Err(_) => format!("{:?}", vedic),
        };
        key.push_str(":vedic=");
        key.push_str(&canonical);
    }

    key
}

/// Unbounded in-process provider backed by a `HashMap`.
///
/// Entries live until [`CacheProvider::clear`] is called.
#[derive(Debug, Default)]
pub struct InMemoryCacheProvider {
    entries: RwLock<HashMap<String, LayerPositions>>,
}

impl InMemoryCacheProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    // A panicking writer cannot leave a half-inserted entry, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, LayerPositions>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, LayerPositions>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheProvider for InMemoryCacheProvider {
    fn get(&self, key: &str) -> Option<LayerPositions> {
        self.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: LayerPositions) {
        self.write().insert(key.to_string(), value);
    }

    fn clear(&self) {
        self.write().clear();
    }
}
