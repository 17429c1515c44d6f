//! Configuration management for parkpatrol.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::{Coordinate, Region, Span, Viewport};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "parkpatrol";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "reports.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PARKPATROL_`)
/// 2. TOML config file at `~/.config/parkpatrol/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Map display configuration.
    pub map: MapConfig,
    /// Reverse geocoding configuration.
    pub geocoder: GeocoderConfig,
    /// Device location configuration.
    pub location: LocationConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/parkpatrol/reports.db`
    pub database_path: Option<PathBuf>,
}

/// Map-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Latitude of the initial map center.
    pub center_latitude: f64,
    /// Longitude of the initial map center.
    pub center_longitude: f64,
    /// North-south extent of the visible region in degrees.
    pub span_latitude: f64,
    /// East-west extent of the visible region in degrees.
    pub span_longitude: f64,
    /// Width of the map view in points.
    pub viewport_width: f64,
    /// Height of the map view in points.
    pub viewport_height: f64,
    /// How long the "alert sent" confirmation stays visible, in milliseconds.
    pub confirmation_ms: u64,
}

/// Which reverse geocoder to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocoderProvider {
    /// A Nominatim-compatible HTTP service.
    #[default]
    Nominatim,
    /// The offline list of named places in `geocoder.places`.
    Gazetteer,
    /// No lookups; every report gets the placeholder name.
    None,
}

/// A named place for the offline gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl NamedPlace {
    /// Create a named place.
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Position of the place.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Reverse geocoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Geocoder backend.
    pub provider: GeocoderProvider,
    /// Base URL of the Nominatim service.
    pub endpoint: String,
    /// User agent sent with HTTP lookups.
    pub user_agent: String,
    /// Upper bound on a single lookup, in milliseconds.
    pub timeout_ms: u64,
    /// Places known to the offline gazetteer.
    pub places: Vec<NamedPlace>,
    /// Maximum distance for a gazetteer match, in metres.
    pub max_distance_m: f64,
}

/// Device location configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Follow device position updates.
    pub enabled: bool,
    /// Positions replayed as device updates.
    pub replay: Vec<Coordinate>,
    /// Interval between replayed positions, in milliseconds.
    pub replay_interval_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // CSUF East Parking
            center_latitude: 33.8818,
            center_longitude: -117.8855,
            span_latitude: 0.01,
            span_longitude: 0.01,
            viewport_width: 390.0,
            viewport_height: 520.0,
            confirmation_ms: 2_000,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::default(),
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("parkpatrol/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 5_000,
            places: default_places(),
            max_distance_m: 150.0,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            replay: Vec::new(),
            replay_interval_ms: 1_000,
        }
    }
}

/// Built-in gazetteer entries around the CSUF campus.
fn default_places() -> Vec<NamedPlace> {
    vec![
        NamedPlace::new("CSUF East Parking", 33.8818, -117.8855),
        NamedPlace::new("CSUF Lot A", 33.8874, -117.8893),
        NamedPlace::new("Nutwood Parking Structure", 33.8790, -117.8885),
        NamedPlace::new("State College Parking Structure", 33.8831, -117.8883),
        NamedPlace::new("Eastside Parking Structure", 33.8806, -117.8818),
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PARKPATROL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        Coordinate::new(self.map.center_latitude, self.map.center_longitude)
            .validate()
            .map_err(|e| invalid(format!("map center: {e}")))?;

        if !(self.map.span_latitude > 0.0 && self.map.span_latitude <= 180.0)
            || !(self.map.span_longitude > 0.0 && self.map.span_longitude <= 360.0)
        {
            return Err(invalid(format!(
                "map span must be positive (got {} x {})",
                self.map.span_latitude, self.map.span_longitude
            )));
        }

        if self.map.viewport_width <= 0.0 || self.map.viewport_height <= 0.0 {
            return Err(invalid("map viewport must have a positive size"));
        }

        if self.map.confirmation_ms == 0 {
            return Err(invalid("confirmation_ms must be greater than 0"));
        }

        if self.geocoder.timeout_ms == 0 {
            return Err(invalid("geocoder timeout_ms must be greater than 0"));
        }

        if self.geocoder.provider == GeocoderProvider::Nominatim
            && self.geocoder.endpoint.trim().is_empty()
        {
            return Err(invalid("geocoder endpoint must not be empty"));
        }

        if self.geocoder.max_distance_m.is_nan() || self.geocoder.max_distance_m < 0.0 {
            return Err(invalid("geocoder max_distance_m must not be negative"));
        }

        for place in &self.geocoder.places {
            if place.name.trim().is_empty() {
                return Err(invalid("gazetteer place names must not be empty"));
            }
            place
                .coordinate()
                .validate()
                .map_err(|e| invalid(format!("gazetteer place '{}': {e}", place.name)))?;
        }

        for point in &self.location.replay {
            point
                .validate()
                .map_err(|e| invalid(format!("location replay: {e}")))?;
        }

        if self.location.replay_interval_ms == 0 {
            return Err(invalid("location replay_interval_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The initial map region.
    #[must_use]
    pub fn default_region(&self) -> Region {
        Region::new(
            Coordinate::new(self.map.center_latitude, self.map.center_longitude),
            Span {
                latitude_delta: self.map.span_latitude,
                longitude_delta: self.map.span_longitude,
            },
        )
    }

    /// The map view size.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.map.viewport_width, self.map.viewport_height)
    }

    /// How long the confirmation banner stays up.
    #[must_use]
    pub fn confirmation_duration(&self) -> Duration {
        Duration::from_millis(self.map.confirmation_ms)
    }

    /// Upper bound on a single reverse lookup.
    #[must_use]
    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_millis(self.geocoder.timeout_ms)
    }

    /// Interval between replayed location updates.
    #[must_use]
    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.location.replay_interval_ms)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
