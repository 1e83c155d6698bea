//! Process configuration read once from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;

use incident_map_analytics_models::{
    DecayParameters, GridSpec, InvalidDecayParametersError, OutOfBoundsPolicy,
};

/// Errors in the startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// The decay settings do not form valid parameters.
    #[error("Invalid decay configuration: {0}")]
    Decay(#[from] InvalidDecayParametersError),
}

/// Everything the server needs to start, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Building height CSV (`BUILDINGS_CSV`).
    pub buildings_csv: PathBuf,
    /// Heatmap grid (`GRID_*`).
    pub grid: GridSpec,
    /// Heatmap decay (`DECAY_*`).
    pub decay: DecayParameters,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value
    /// or the decay settings are out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value
    /// or the decay settings are out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_grid = GridSpec::default();
        let default_decay = DecayParameters::default();

        let grid = GridSpec {
            min_lat: parse_or(&lookup, "GRID_MIN_LAT", default_grid.min_lat)?,
            max_lat: parse_or(&lookup, "GRID_MAX_LAT", default_grid.max_lat)?,
            min_lng: parse_or(&lookup, "GRID_MIN_LNG", default_grid.min_lng)?,
            max_lng: parse_or(&lookup, "GRID_MAX_LNG", default_grid.max_lng)?,
            lat_steps: parse_or(&lookup, "GRID_LAT_STEPS", default_grid.lat_steps)?,
            lng_steps: parse_or(&lookup, "GRID_LNG_STEPS", default_grid.lng_steps)?,
            // Live reports can land anywhere, so the server drops strays
            // instead of failing the whole heatmap.
            out_of_bounds: parse_or(&lookup, "GRID_OUT_OF_BOUNDS", OutOfBoundsPolicy::Drop)?,
        };

        let decay = DecayParameters::new(
            parse_or(
                &lookup,
                "DECAY_HALF_LIFE_SECONDS",
                default_decay.half_life_seconds(),
            )?,
            parse_or(&lookup, "DECAY_SCALE_FACTOR", default_decay.scale_factor())?,
            parse_or(
                &lookup,
                "DECAY_MIN_SIGNIFICANCE",
                default_decay.min_significance(),
            )?,
        )?;

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            buildings_csv: lookup("BUILDINGS_CSV")
                .map_or_else(|| PathBuf::from("data/building_heights.csv"), PathBuf::from),
            grid,
            decay,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.buildings_csv, PathBuf::from("data/building_heights.csv"));
        assert_eq!(config.grid.lat_steps, GridSpec::default().lat_steps);
        assert_eq!(config.grid.out_of_bounds, OutOfBoundsPolicy::Drop);
        assert_eq!(config.decay, DecayParameters::default());
    }

    #[test]
    fn overrides_from_lookup() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("GRID_LAT_STEPS", "100"),
            ("GRID_OUT_OF_BOUNDS", "clamp"),
            ("DECAY_HALF_LIFE_SECONDS", "600"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.grid.lat_steps, 100);
        assert_eq!(config.grid.out_of_bounds, OutOfBoundsPolicy::Clamp);
        assert!((config.decay.half_life_seconds() - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unparsable_values() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn rejects_invalid_decay() {
        let err = ServerConfig::from_lookup(lookup_from(&[("DECAY_SCALE_FACTOR", "1.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Decay(_)));
    }
}
