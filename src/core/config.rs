//! Application configuration
//!
//! Every section has defaults matching the constants in
//! [`crate::core::constants`], so an empty JSON object (or no file at all)
//! yields a working setup. The places API key is normally supplied through
//! the environment rather than the file.

use crate::core::constants::*;
use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an optional JSON config file
pub const CONFIG_PATH_ENV: &str = "FILMSPOT_CONFIG";

/// Environment variables checked, in order, for the places API key
pub const API_KEY_ENVS: [&str; 2] = ["FILMSPOT_GOOGLE_MAPS_API_KEY", "GOOGLE_MAPS_API_KEY"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapConfig,
    pub geolocation: GeolocationConfig,
    pub places: PlacesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub initial_center: LatLng,
    pub initial_zoom: f64,
    /// Zoom applied by programmatic pans (search result, locate)
    pub street_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders
    pub tile_url: String,
    pub attribution: String,
    pub user_agent: String,
    /// Decoded tiles kept as textures
    pub tile_cache_size: usize,
    pub show_zoom_controls: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_center: INITIAL_CENTER,
            initial_zoom: INITIAL_ZOOM,
            street_zoom: STREET_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tile_cache_size: 256,
            show_zoom_controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// 0 means a cached fix is never reused
    pub maximum_age_ms: u64,
    pub endpoint: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            high_accuracy: true,
            timeout_ms: LOCATE_TIMEOUT_MS,
            maximum_age_ms: 0,
            endpoint: DEFAULT_GEOLOCATION_ENDPOINT.to_string(),
        }
    }
}

impl GeolocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Bias center for autocomplete; the initial map center when unset
    pub bias_center: Option<LatLng>,
    pub bias_radius_m: u32,
    pub debounce_ms: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            bias_center: None,
            bias_radius_m: SEARCH_BIAS_RADIUS_M,
            debounce_ms: SEARCH_DEBOUNCE_MS,
        }
    }
}

impl PlacesConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Loads the file named by `FILMSPOT_CONFIG` (defaults when unset) and
    /// fills the API key from the environment if the file has none
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => {
                log::info!("loading configuration from {}", path);
                Self::from_file(path)?
            }
            _ => Self::default(),
        };

        if config.places.api_key.is_none() {
            config.places.api_key = API_KEY_ENVS
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    /// Center used to bias autocomplete queries
    pub fn bias_center(&self) -> LatLng {
        self.places.bias_center.unwrap_or(self.map.initial_center)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = &self.map;
        if !map.initial_center.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "initial center {} is out of range",
                map.initial_center
            )));
        }
        if !(map.min_zoom.is_finite() && map.max_zoom.is_finite()) || map.min_zoom > map.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} is empty",
                map.min_zoom, map.max_zoom
            )));
        }
        for zoom in [map.initial_zoom, map.street_zoom] {
            if !(map.min_zoom..=map.max_zoom).contains(&zoom) {
                return Err(ConfigError::Invalid(format!(
                    "zoom {} is outside {}..{}",
                    zoom, map.min_zoom, map.max_zoom
                )));
            }
        }
        if ["{z}", "{x}", "{y}"]
            .iter()
            .any(|placeholder| !map.tile_url.contains(placeholder))
        {
            return Err(ConfigError::Invalid(format!(
                "tile url {:?} must contain {{z}}, {{x}} and {{y}}",
                map.tile_url
            )));
        }
        if map.tile_cache_size == 0 {
            return Err(ConfigError::Invalid("tile cache size must be positive".into()));
        }
        if self.geolocation.timeout_ms == 0 {
            return Err(ConfigError::Invalid("geolocation timeout must be positive".into()));
        }
        if let Some(center) = self.places.bias_center {
            if !center.is_valid() {
                return Err(ConfigError::Invalid(format!("bias center {} is out of range", center)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.map.initial_zoom, 10.0);
        assert_eq!(config.map.street_zoom, 14.0);
        assert_eq!(config.places.bias_radius_m, 200_000);
        assert_eq!(config.geolocation.timeout(), Duration::from_secs(5));
        assert_eq!(config.geolocation.maximum_age(), Duration::ZERO);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "map": { "initial_zoom": 12.0 } }"#).unwrap();
        assert_eq!(config.map.initial_zoom, 12.0);
        assert_eq!(config.map.tile_url, DEFAULT_TILE_URL);
        assert_eq!(config.bias_center(), INITIAL_CENTER);
    }

    #[test]
    fn test_rejects_tile_url_without_placeholders() {
        let mut config = AppConfig::default();
        config.map.tile_url = "https://tiles.example.com/static.png".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let mut config = AppConfig::default();
        config.map.min_zoom = 15.0;
        config.map.max_zoom = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(AppConfig::from_json("{ map: "), Err(ConfigError::Parse(_))));
    }
}
