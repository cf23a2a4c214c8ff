//! Vedic (Jyotish) calculation options carried inside ephemeris settings.
//!
//! Every field is optional and an absent field is not the same as `false`:
//! backends decide their own defaults for options the caller left out.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subdivision depth of a dasha timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum DashaLevel {
    Mahadasha,
    Antardasha,
    Pratyantardasha,
}

impl DashaLevel {
    pub const ALL: [DashaLevel; 3] = [
        DashaLevel::Mahadasha,
        DashaLevel::Antardasha,
        DashaLevel::Pratyantardasha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashaLevel::Mahadasha => "mahadasha",
            DashaLevel::Antardasha => "antardasha",
            DashaLevel::Pratyantardasha => "pratyantardasha",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == name)
    }
}

impl fmt::Display for DashaLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(schemars::JsonSchema))]
pub struct VedicOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_nakshatras: Option<bool>,
    /// Divisional charts to compute, e.g. "d9"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_vargas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_dashas: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dasha_systems: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashas_depth: Option<DashaLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_yogas: Option<bool>,
}

impl VedicOptions {
    /// True when no option has been set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
