use crate::ephemeris::types::{EphemerisSettings, GeoLocation};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Relative locations tried by [`load_service_config`], in order
pub const CONFIG_PATHS: &[&str] = &["configs/ephemeris.toml", "../../configs/ephemeris.toml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not load ephemeris config from {tried:?}")]
    NotFound { tried: Vec<String> },
    #[error("Failed to parse ephemeris config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing [ephemeris] table in config")]
    MissingSection,
    #[error("Invalid ephemeris config: {0}")]
    Invalid(String),
}

/// Construction parameters for an ephemeris service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub enable_cache: bool,
    /// Settings used when a caller does not supply its own
    pub default_settings: EphemerisSettings,
    pub default_location: Option<GeoLocation>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enable_cache: false,
            default_settings: EphemerisSettings::default(),
            default_location: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EphemerisToml {
    #[serde(default)]
    enable_cache: bool,
    #[serde(default)]
    defaults: Option<EphemerisSettings>,
    #[serde(default)]
    location: Option<GeoLocation>,
}

#[derive(Debug, Clone, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    ephemeris: Option<EphemerisToml>,
}

impl ServiceConfig {
    /// Parse the `[ephemeris]` table of a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let root: RootConfigToml = toml::from_str(text)?;
        let EphemerisToml {
            enable_cache,
            defaults,
            location,
        } = root.ephemeris.ok_or(ConfigError::MissingSection)?;

        if let Some(loc) = &location {
            if !loc.is_in_range() {
                return Err(ConfigError::Invalid(format!(
                    "ephemeris.location out of range: lat={}, lon={}",
                    loc.lat, loc.lon
                )));
            }
        }

        Ok(Self {
            enable_cache,
            default_settings: defaults.unwrap_or_default(),
            default_location: location,
        })
    }
}

pub fn load_service_config_from(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = ServiceConfig::from_toml_str(&text)?;
    log::debug!("Loaded ephemeris config from {}", path.display());
    Ok(config)
}

/// Try the common relative paths for `configs/ephemeris.toml`
pub fn load_service_config() -> Result<ServiceConfig, ConfigError> {
    for p in CONFIG_PATHS {
        let path = Path::new(p);
        if path.exists() {
            return load_service_config_from(path);
        }
    }
    Err(ConfigError::NotFound {
        tried: CONFIG_PATHS.iter().map(|p| p.to_string()).collect(),
    })
}
