pub mod adapter;
pub mod types;

pub use adapter::{EphemerisAdapter, EphemerisError, JsonAdapter, JsonEphemerisBackend};
pub use types::{
    normalize_degrees, EphemerisSettings, GeoLocation, HousePositions, LayerContext,
    LayerPositions, PlanetPosition, ZodiacType, ANGLE_LABELS,
};
