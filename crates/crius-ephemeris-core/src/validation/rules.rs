use super::Violation;
use crate::ephemeris::types::{
    EphemerisSettings, GeoLocation, HousePositions, LayerContext, LayerPositions, PlanetPosition,
    ZodiacType, ANGLE_LABELS,
};
use crate::vedic::{DashaLevel, VedicOptions};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Collects violations while walking a value; never stops at the first one
#[derive(Debug, Default)]
pub(crate) struct Checker {
    violations: Vec<Violation>,
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Checker {
    pub(crate) fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    fn violation(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn expected(&mut self, path: &str, expected: &str, value: &Value) {
        self.violation(
            path,
            format!("expected {}, got {}", expected, type_name(value)),
        );
    }

    /// Object with a closed set of keys
    fn object<'v>(
        &mut self,
        path: &str,
        value: &'v Value,
        allowed: &[&str],
    ) -> Option<&'v Map<String, Value>> {
        let Some(map) = value.as_object() else {
            self.expected(path, "object", value);
            return None;
        };
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.violation(&join(path, key), "unrecognized field");
            }
        }
        Some(map)
    }

    fn required<'v>(
        &mut self,
        path: &str,
        map: &'v Map<String, Value>,
        key: &str,
    ) -> Option<&'v Value> {
        let value = map.get(key);
        if value.is_none() {
            self.violation(&join(path, key), "field required");
        }
        value
    }

    /// Absent and `null` both mean "not set"
    fn optional<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
        map.get(key).filter(|v| !v.is_null())
    }

    fn number(&mut self, path: &str, value: &Value) -> Option<f64> {
        let n = value.as_f64();
        if n.is_none() {
            self.expected(path, "number", value);
        }
        n
    }

    fn number_in(&mut self, path: &str, value: &Value, min: f64, max: f64) -> Option<f64> {
        let n = self.number(path, value)?;
        if !(min..=max).contains(&n) {
            self.violation(
                path,
                format!("must be between {} and {}, got {}", min, max, n),
            );
            return None;
        }
        Some(n)
    }

    fn boolean(&mut self, path: &str, value: &Value) -> Option<bool> {
        let b = value.as_bool();
        if b.is_none() {
            self.expected(path, "boolean", value);
        }
        b
    }

    fn string(&mut self, path: &str, value: &Value) -> Option<String> {
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.expected(path, "string", value);
                None
            }
        }
    }

    fn string_list(&mut self, path: &str, value: &Value) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.expected(path, "array of strings", value);
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match self.string(&join(path, &i.to_string()), item) {
                Some(s) => out.push(s),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    fn degree_map(&mut self, path: &str, value: &Value) -> Option<HashMap<String, f64>> {
        let Some(map) = value.as_object() else {
            self.expected(path, "object", value);
            return None;
        };
        let mut out = HashMap::with_capacity(map.len());
        let mut ok = true;
        for (key, degrees) in map {
            match self.number(&join(path, key), degrees) {
                Some(n) => {
                    out.insert(key.clone(), n);
                }
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    fn one_of<T: Copy>(
        &mut self,
        path: &str,
        value: &Value,
        names: &[&str],
        lookup: fn(&str) -> Option<T>,
    ) -> Option<T> {
        let name = self.string(path, value)?;
        let parsed = lookup(&name);
        if parsed.is_none() {
            let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
            self.violation(
                path,
                format!("must be one of {}, got '{}'", quoted.join(", "), name),
            );
        }
        parsed
    }

    fn utc_timestamp(&mut self, path: &str, value: &Value) -> Option<DateTime<Utc>> {
        let text = self.string(path, value)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
            if dt.offset().local_minus_utc() != 0 {
                self.violation(
                    path,
                    format!("must be a UTC timestamp, got offset {}", dt.offset()),
                );
                return None;
            }
            return Some(dt.with_timezone(&Utc));
        }
        // Naive timestamps are taken as UTC
        let naive = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S"));
        match naive {
            Ok(naive) => Some(Utc.from_utc_datetime(&naive)),
            Err(_) => {
                self.violation(path, format!("expected ISO-8601 timestamp, got '{}'", text));
                None
            }
        }
    }
}

pub(crate) fn geo_location(c: &mut Checker, path: &str, value: &Value) -> Option<GeoLocation> {
    let map = c.object(path, value, &["lat", "lon"])?;
    let lat = c
        .required(path, map, "lat")
        .and_then(|v| c.number_in(&join(path, "lat"), v, -90.0, 90.0));
    let lon = c
        .required(path, map, "lon")
        .and_then(|v| c.number_in(&join(path, "lon"), v, -180.0, 180.0));
    Some(GeoLocation {
        lat: lat?,
        lon: lon?,
    })
}

pub(crate) fn planet_position(
    c: &mut Checker,
    path: &str,
    value: &Value,
) -> Option<PlanetPosition> {
    let map = c.object(path, value, &["lon", "lat", "speed_lon", "retrograde"])?;
    let lon = c.required(path, map, "lon").and_then(|v| {
        let p = join(path, "lon");
        let n = c.number(&p, v)?;
        if !(0.0..360.0).contains(&n) {
            c.violation(&p, format!("must be >= 0 and < 360, got {}", n));
            return None;
        }
        Some(n)
    });
    let lat = c
        .required(path, map, "lat")
        .and_then(|v| c.number(&join(path, "lat"), v));
    let speed_lon = c
        .required(path, map, "speed_lon")
        .and_then(|v| c.number(&join(path, "speed_lon"), v));
    let retrograde = c
        .required(path, map, "retrograde")
        .and_then(|v| c.boolean(&join(path, "retrograde"), v));
    Some(PlanetPosition {
        lon: lon?,
        lat: lat?,
        speed_lon: speed_lon?,
        retrograde: retrograde?,
    })
}

pub(crate) fn house_positions(
    c: &mut Checker,
    path: &str,
    value: &Value,
) -> Option<HousePositions> {
    let map = c.object(path, value, &["system", "cusps", "angles"])?;
    let system = c
        .required(path, map, "system")
        .and_then(|v| c.string(&join(path, "system"), v));
    let cusps = c
        .required(path, map, "cusps")
        .and_then(|v| c.degree_map(&join(path, "cusps"), v));
    let angles = c.required(path, map, "angles").and_then(|v| {
        let p = join(path, "angles");
        let angles = c.degree_map(&p, v)?;
        let missing: Vec<&str> = ANGLE_LABELS
            .iter()
            .copied()
            .filter(|label| !angles.contains_key(*label))
            .collect();
        if !missing.is_empty() {
            c.violation(&p, format!("missing angles: {}", missing.join(", ")));
            return None;
        }
        Some(angles)
    });
    Some(HousePositions {
        system: system?,
        cusps: cusps?,
        angles: angles?,
    })
}

pub(crate) fn vedic_options(c: &mut Checker, path: &str, value: &Value) -> Option<VedicOptions> {
    let map = c.object(
        path,
        value,
        &[
            "include_nakshatras",
            "enabled_vargas",
            "include_dashas",
            "dasha_systems",
            "dashas_depth",
            "include_yogas",
        ],
    )?;
    let mut ok = true;
    let mut flag = |c: &mut Checker, key: &str| match Checker::optional(map, key) {
        None => None,
        Some(v) => {
            let parsed = c.boolean(&join(path, key), v);
            ok &= parsed.is_some();
            parsed
        }
    };
    let include_nakshatras = flag(c, "include_nakshatras");
    let include_dashas = flag(c, "include_dashas");
    let include_yogas = flag(c, "include_yogas");

    let mut list = |c: &mut Checker, key: &str| match Checker::optional(map, key) {
        None => None,
        Some(v) => {
            let parsed = c.string_list(&join(path, key), v);
            ok &= parsed.is_some();
            parsed
        }
    };
    let enabled_vargas = list(c, "enabled_vargas");
    let dasha_systems = list(c, "dasha_systems");

    let dashas_depth = match Checker::optional(map, "dashas_depth") {
        None => None,
        Some(v) => {
            let names: Vec<&str> = DashaLevel::ALL.iter().map(DashaLevel::as_str).collect();
            let parsed = c.one_of(
                &join(path, "dashas_depth"),
                v,
                &names,
                DashaLevel::from_name,
            );
            ok &= parsed.is_some();
            parsed
        }
    };

    ok.then_some(VedicOptions {
        include_nakshatras,
        enabled_vargas,
        include_dashas,
        dasha_systems,
        dashas_depth,
        include_yogas,
    })
}

pub(crate) fn ephemeris_settings(
    c: &mut Checker,
    path: &str,
    value: &Value,
) -> Option<EphemerisSettings> {
    let map = c.object(
        path,
        value,
        &[
            "zodiac_type",
            "ayanamsa",
            "house_system",
            "include_objects",
            "vedic_options",
        ],
    )?;
    let names: Vec<&str> = ZodiacType::ALL.iter().map(ZodiacType::as_str).collect();
    let zodiac_type = c
        .required(path, map, "zodiac_type")
        .and_then(|v| c.one_of(&join(path, "zodiac_type"), v, &names, ZodiacType::from_name));
    let ayanamsa = match Checker::optional(map, "ayanamsa") {
        None => Some(None),
        Some(v) => c.string(&join(path, "ayanamsa"), v).map(Some),
    };
    let house_system = c
        .required(path, map, "house_system")
        .and_then(|v| c.string(&join(path, "house_system"), v));
    let include_objects = c
        .required(path, map, "include_objects")
        .and_then(|v| c.string_list(&join(path, "include_objects"), v));
    let vedic = match Checker::optional(map, "vedic_options") {
        None => Some(None),
        Some(v) => vedic_options(c, &join(path, "vedic_options"), v).map(Some),
    };
    Some(EphemerisSettings {
        zodiac_type: zodiac_type?,
        ayanamsa: ayanamsa?,
        house_system: house_system?,
        include_objects: include_objects?,
        vedic_options: vedic?,
    })
}

pub(crate) fn layer_positions(
    c: &mut Checker,
    path: &str,
    value: &Value,
) -> Option<LayerPositions> {
    let map = c.object(path, value, &["planets", "houses"])?;
    let planets = c.required(path, map, "planets").and_then(|v| {
        let p = join(path, "planets");
        let Some(entries) = v.as_object() else {
            c.expected(&p, "object", v);
            return None;
        };
        let mut planets = HashMap::with_capacity(entries.len());
        let mut ok = true;
        for (planet_id, position) in entries {
            match planet_position(c, &join(&p, planet_id), position) {
                Some(pos) => {
                    planets.insert(planet_id.clone(), pos);
                }
                None => ok = false,
            }
        }
        ok.then_some(planets)
    });
    let houses = match Checker::optional(map, "houses") {
        None => Some(None),
        Some(v) => house_positions(c, &join(path, "houses"), v).map(Some),
    };
    Some(LayerPositions {
        planets: planets?,
        houses: houses?,
    })
}

pub(crate) fn layer_context(c: &mut Checker, path: &str, value: &Value) -> Option<LayerContext> {
    let map = c.object(
        path,
        value,
        &["layer_id", "kind", "datetime", "location", "settings"],
    )?;
    let layer_id = c
        .required(path, map, "layer_id")
        .and_then(|v| c.string(&join(path, "layer_id"), v));
    let kind = c
        .required(path, map, "kind")
        .and_then(|v| c.string(&join(path, "kind"), v));
    let datetime = c
        .required(path, map, "datetime")
        .and_then(|v| c.utc_timestamp(&join(path, "datetime"), v));
    let location = match Checker::optional(map, "location") {
        None => Some(None),
        Some(v) => geo_location(c, &join(path, "location"), v).map(Some),
    };
    let settings = c
        .required(path, map, "settings")
        .and_then(|v| ephemeris_settings(c, &join(path, "settings"), v));
    Some(LayerContext {
        layer_id: layer_id?,
        kind: kind?,
        datetime: datetime?,
        location: location?,
        settings: settings?,
    })
}
