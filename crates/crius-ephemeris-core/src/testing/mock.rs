use crate::ephemeris::adapter::{EphemerisAdapter, EphemerisError};
use crate::ephemeris::types::{
    EphemerisSettings, GeoLocation, HousePositions, LayerPositions, PlanetPosition,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Arguments of one `calc_positions` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub dt_utc: DateTime<Utc>,
    pub location: Option<GeoLocation>,
    pub settings: EphemerisSettings,
}

#[derive(Debug, Default)]
struct Recorder {
    call_count: usize,
    last_call: Option<RecordedCall>,
}

/// Configurable test double for [`EphemerisAdapter`].
///
/// Clones share one recorder, so a clone handed to a service can still be
/// inspected through the handle kept by the test.
#[derive(Debug, Clone)]
pub struct MockEphemerisAdapter {
    return_value: LayerPositions,
    error: Option<EphemerisError>,
    recorder: Arc<Mutex<Recorder>>,
}

impl MockEphemerisAdapter {
    /// Mock returning no planets and no houses
    pub fn new() -> Self {
        Self::with_return(LayerPositions::default())
    }

    pub fn with_return(return_value: LayerPositions) -> Self {
        Self {
            return_value,
            error: None,
            recorder: Arc::new(Mutex::new(Recorder::default())),
        }
    }

    /// Mock that fails every call with `error`
    pub fn failing(error: EphemerisError) -> Self {
        Self {
            error: Some(error),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.recorder().call_count
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.recorder().last_call.clone()
    }

    pub fn reset(&self) {
        *self.recorder() = Recorder::default();
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockEphemerisAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemerisAdapter for MockEphemerisAdapter {
    fn calc_positions(
        &mut self,
        dt_utc: DateTime<Utc>,
        location: Option<GeoLocation>,
        settings: &EphemerisSettings,
    ) -> Result<LayerPositions, EphemerisError> {
        {
            let mut recorder = self.recorder();
            recorder.call_count += 1;
            recorder.last_call = Some(RecordedCall {
                dt_utc,
                location,
                settings: settings.clone(),
            });
        }

        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.return_value.clone()),
        }
    }
}

/// Mock adapter returning the given planets and houses
pub fn create_test_adapter(
    planets: HashMap<String, PlanetPosition>,
    houses: Option<HousePositions>,
) -> MockEphemerisAdapter {
    MockEphemerisAdapter::with_return(LayerPositions { planets, houses })
}
