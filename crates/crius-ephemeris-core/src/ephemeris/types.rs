use crate::vedic::VedicOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical angle labels every house calculation reports
pub const ANGLE_LABELS: [&str; 4] = ["asc", "mc", "ic", "dc"];

/// Map any finite angle into the half-open range [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct GeoLocation {
    /// Latitude in degrees (-90..=90)
    pub lat: f64,
    /// Longitude in degrees (-180..=180)
    pub lon: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates fall inside their geographic ranges
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Planetary position data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct PlanetPosition {
    /// Longitude in degrees (0-360)
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Speed in longitude (degrees per day)
    pub speed_lon: f64,
    /// Whether the planet is retrograde
    pub retrograde: bool,
}

impl PlanetPosition {
    /// Build a position from raw backend output.
    ///
    /// The longitude is normalized into [0, 360) and the body is flagged
    /// retrograde when its longitudinal speed is negative.
    pub fn new(lon: f64, lat: f64, speed_lon: f64) -> Self {
        Self {
            lon: normalize_degrees(lon),
            lat,
            speed_lon,
            retrograde: speed_lon < 0.0,
        }
    }
}

/// House system positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct HousePositions {
    /// House system name
    pub system: String,
    /// House cusps: "1".."12" -> degrees
    pub cusps: HashMap<String, f64>,
    /// Angles: "asc", "mc", "ic", "dc" -> degrees
    pub angles: HashMap<String, f64>,
}

impl HousePositions {
    /// Cusp of house `number` (1-based)
    pub fn cusp(&self, number: u8) -> Option<f64> {
        self.cusps.get(&number.to_string()).copied()
    }

    pub fn angle(&self, label: &str) -> Option<f64> {
        self.angles.get(label).copied()
    }

    /// Canonical angle labels absent from `angles`
    pub fn missing_angles(&self) -> Vec<&'static str> {
        ANGLE_LABELS
            .iter()
            .copied()
            .filter(|label| !self.angles.contains_key(*label))
            .collect()
    }
}

/// Complete position data for a chart layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct LayerPositions {
    /// Planet ID -> position
    pub planets: HashMap<String, PlanetPosition>,
    /// House positions (None if no location provided)
    pub houses: Option<HousePositions>,
}

/// Zodiac reference frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ZodiacType {
    Tropical,
    Sidereal,
}

impl ZodiacType {
    pub const ALL: [ZodiacType; 2] = [ZodiacType::Tropical, ZodiacType::Sidereal];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZodiacType::Tropical => "tropical",
            ZodiacType::Sidereal => "sidereal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|z| z.as_str() == name)
    }
}

impl fmt::Display for ZodiacType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for ephemeris calculations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct EphemerisSettings {
    pub zodiac_type: ZodiacType,
    /// Ayanamsa name (for sidereal zodiac; not enforced otherwise)
    #[serde(default)]
    pub ayanamsa: Option<String>,
    /// House system name
    pub house_system: String,
    /// List of object IDs to include
    pub include_objects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vedic_options: Option<VedicOptions>,
}

impl Default for EphemerisSettings {
    fn default() -> Self {
        Self {
            zodiac_type: ZodiacType::Tropical,
            ayanamsa: None,
            house_system: "placidus".to_string(),
            include_objects: vec!["sun".to_string()],
            vedic_options: None,
        }
    }
}

/// Context for calculating positions for a chart layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct LayerContext {
    pub layer_id: String,
    /// Layer kind, e.g. "natal" or "transit"
    pub kind: String,
    /// Calculation instant, always UTC
    pub datetime: DateTime<Utc>,
    pub location: Option<GeoLocation>,
    pub settings: EphemerisSettings,
}

impl LayerContext {
    pub fn new(
        layer_id: impl Into<String>,
        kind: impl Into<String>,
        datetime: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: EphemerisSettings,
    ) -> Self {
        Self {
            layer_id: layer_id.into(),
            kind: kind.into(),
            datetime,
            location,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(370.5), 10.5);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert!(normalize_degrees(-1e-15) < 360.0);
    }

    #[test]
    fn test_planet_position_new_flags_retrograde() {
        let pos = PlanetPosition::new(-10.0, 1.2, -0.25);
        assert_eq!(pos.lon, 350.0);
        assert!(pos.retrograde);

        let direct = PlanetPosition::new(10.0, 0.0, 0.98);
        assert!(!direct.retrograde);
    }

    #[test]
    fn test_missing_angles() {
        let houses = HousePositions {
            system: "placidus".to_string(),
            cusps: HashMap::new(),
            angles: HashMap::from([("asc".to_string(), 15.0), ("mc".to_string(), 105.0)]),
        };
        assert_eq!(houses.missing_angles(), vec!["ic", "dc"]);
        assert_eq!(houses.angle("asc"), Some(15.0));
        assert_eq!(houses.cusp(1), None);
    }

    #[test]
    fn test_settings_serialize_ayanamsa_as_null() {
        let json = serde_json::to_value(EphemerisSettings::default()).unwrap();
        assert_eq!(json["zodiac_type"], "tropical");
        assert!(json["ayanamsa"].is_null());
        assert!(json.get("vedic_options").is_none());
    }
}
