use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::state::{DEFAULT_ZOOM, MapUiState};

pub const CONFIG_ENV: &str = "OPSDECK_CONFIG";
const CONFIG_NAMES: [&str; 4] = [
    "opsdeck.yaml",
    "opsdeck.yml",
    ".opsdeck.yaml",
    ".opsdeck.yml",
];
const MAX_ZOOM: f64 = 22.0;

/// Initial map viewport
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MapConfig {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            zoom: DEFAULT_ZOOM,
        }
    }
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

/// Root configuration file structure
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct OpsdeckConfig {
    /// Delay before a detection payload is handed to the estimate module
    #[serde(default = "default_handoff_delay")]
    pub handoff_delay_ms: u64,

    /// Events buffered per bridge subscriber before it starts lagging
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    #[serde(default)]
    pub map: MapConfig,

    /// Where persisted preferences live (defaults to `.opsdeck`)
    #[serde(default)]
    pub preferences_dir: Option<PathBuf>,

    /// Terminal width, in columns, below which the compact layout is used
    #[serde(default = "default_compact_width")]
    pub compact_width: u16,
}

fn default_handoff_delay() -> u64 {
    50
}
fn default_bus_capacity() -> usize {
    DEFAULT_BUS_CAPACITY
}
fn default_compact_width() -> u16 {
    100
}

impl Default for OpsdeckConfig {
    fn default() -> Self {
        Self {
            handoff_delay_ms: default_handoff_delay(),
            bus_capacity: default_bus_capacity(),
            map: MapConfig::default(),
            preferences_dir: None,
            compact_width: default_compact_width(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("no config file found, searched: {searched:?}")]
    NotFound { searched: Vec<PathBuf> },
}

impl OpsdeckConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: OpsdeckConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search for config file in standard locations
    pub fn discover(start_dir: &Path) -> Result<(PathBuf, Self), ConfigError> {
        let mut searched = Vec::new();

        // Check environment variable first
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok((path.clone(), Self::load(&path)?));
            }
            searched.push(path);
        }

        // Search current directory and parents
        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            for name in &CONFIG_NAMES {
                let path = current.join(name);
                if path.exists() {
                    return Ok((path.clone(), Self::load(&path)?));
                }
                searched.push(path);
            }
            dir = current.parent();
        }

        Err(ConfigError::NotFound { searched })
    }

    /// Like [`discover`](Self::discover), but a missing file means defaults.
    pub fn discover_or_default(start_dir: &Path) -> Result<(Option<PathBuf>, Self), ConfigError> {
        match Self::discover(start_dir) {
            Ok((path, config)) => Ok((Some(path), config)),
            Err(ConfigError::NotFound { .. }) => Ok((None, Self::default())),
            Err(e) => Err(e),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bus_capacity == 0 {
            return Err(invalid("bus_capacity", "must be greater than zero"));
        }
        let MapConfig { lat, lng, zoom } = self.map;
        if !(0.0..=MAX_ZOOM).contains(&zoom) {
            return Err(invalid("map.zoom", format!("{zoom} is outside 0..={MAX_ZOOM}")));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(invalid("map.lat", format!("{lat} is outside -90..=90")));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(invalid("map.lng", format!("{lng} is outside -180..=180")));
        }
        Ok(())
    }

    pub fn handoff_delay(&self) -> Duration {
        Duration::from_millis(self.handoff_delay_ms)
    }

    pub fn initial_map(&self) -> MapUiState {
        MapUiState::centered(self.map.lat, self.map.lng, self.map.zoom)
    }

    /// Preference directory, resolved against `base` when relative.
    pub fn preferences_dir(&self, base: &Path) -> PathBuf {
        let dir = self
            .preferences_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".opsdeck"));
        if dir.is_absolute() { dir } else { base.join(dir) }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
handoff_delay_ms: 120
bus_capacity: 32
map:
  lat: 40.71
  lng: -74.0
  zoom: 12
preferences_dir: /var/lib/opsdeck
compact_width: 80
"#;
        let config = OpsdeckConfig::parse(yaml).unwrap();
        assert_eq!(config.handoff_delay(), Duration::from_millis(120));
        assert_eq!(config.bus_capacity, 32);
        assert_eq!(config.map.zoom, 12.0);
        assert_eq!(config.compact_width, 80);
        assert_eq!(
            config.preferences_dir(Path::new("/tmp")),
            PathBuf::from("/var/lib/opsdeck")
        );
    }

    #[test]
    fn test_empty_mapping_uses_defaults() {
        let config = OpsdeckConfig::parse("{}").unwrap();
        assert_eq!(config, OpsdeckConfig::default());
        assert_eq!(config.handoff_delay_ms, 50);
        assert_eq!(config.initial_map(), MapUiState::default());
        assert_eq!(
            config.preferences_dir(Path::new("/srv")),
            PathBuf::from("/srv/.opsdeck")
        );
    }

    #[test]
    fn test_partial_map_keeps_default_zoom() {
        let config = OpsdeckConfig::parse("map:\n  lat: 10\n").unwrap();
        assert_eq!(config.map.zoom, DEFAULT_ZOOM);
        assert_eq!(config.map.lat, 10.0);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = OpsdeckConfig::parse("bus_capacity: 0");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "bus_capacity",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_viewport() {
        for yaml in ["map: { zoom: 30 }", "map: { lat: 91 }", "map: { lng: -181 }"] {
            assert!(
                matches!(OpsdeckConfig::parse(yaml), Err(ConfigError::Invalid { .. })),
                "{yaml}"
            );
        }
    }

    #[test]
    fn test_malformed_yaml_is_a_yaml_error() {
        let result = OpsdeckConfig::parse("handoff_delay_ms: [not, a, number]");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }
}
