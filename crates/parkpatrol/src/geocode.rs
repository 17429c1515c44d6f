//! Reverse geocoding: turning a coordinate into a place name.
//!
//! Lookups are best effort. [`resolve_name`] never fails: errors, timeouts
//! and empty answers all degrade to [`UNKNOWN_LOCATION`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{GeocoderConfig, GeocoderProvider, NamedPlace};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::report::UNKNOWN_LOCATION;

/// A service that resolves coordinates to place names.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Name of this backend (for logging).
    fn name(&self) -> &'static str;

    /// Look up the place name for `coordinate`.
    ///
    /// Returns `Ok(None)` when the service has no answer for the position.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>>;
}

/// Resolve a display name for `coordinate`, bounded by `timeout`.
pub async fn resolve_name(
    geocoder: &dyn ReverseGeocoder,
    coordinate: Coordinate,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, geocoder.reverse(coordinate)).await {
        Ok(Ok(Some(name))) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(Ok(_)) => {
            debug!(geocoder = geocoder.name(), %coordinate, "No place name found");
            UNKNOWN_LOCATION.to_string()
        }
        Ok(Err(e)) => {
            warn!(geocoder = geocoder.name(), %coordinate, error = %e, "Reverse geocoding failed");
            UNKNOWN_LOCATION.to_string()
        }
        Err(_) => {
            warn!(
                geocoder = geocoder.name(),
                %coordinate,
                timeout_ms = timeout.as_millis(),
                "Reverse geocoding timed out"
            );
            UNKNOWN_LOCATION.to_string()
        }
    }
}

/// Build the geocoder selected in the configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_geocoder(config: &GeocoderConfig) -> Result<Arc<dyn ReverseGeocoder>> {
    let geocoder: Arc<dyn ReverseGeocoder> = match config.provider {
        GeocoderProvider::Nominatim => Arc::new(NominatimGeocoder::new(
            &config.endpoint,
            &config.user_agent,
            Duration::from_millis(config.timeout_ms),
        )?),
        GeocoderProvider::Gazetteer => Arc::new(GazetteerGeocoder::new(
            config.places.clone(),
            config.max_distance_m,
        )),
        GeocoderProvider::None => Arc::new(NullGeocoder),
    };
    debug!(geocoder = geocoder.name(), "Geocoder ready");
    Ok(geocoder)
}

/// Reverse geocoding against a Nominatim-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    reverse_url: Url,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl NominatimResponse {
    fn into_name(self) -> Option<String> {
        if self.error.is_some() {
            return None;
        }
        self.name
            .filter(|name| !name.trim().is_empty())
            .or(self.display_name)
            .filter(|name| !name.trim().is_empty())
    }
}

impl NominatimGeocoder {
    /// Create a client for the service rooted at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| Error::geocoder("nominatim", format!("invalid endpoint: {e}")))?;
        let reverse_url = Url::parse(&format!("{}/reverse", base.as_str().trim_end_matches('/')))
            .map_err(|e| Error::geocoder("nominatim", format!("invalid endpoint: {e}")))?;

        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, reverse_url })
    }

    /// The URL queried for reverse lookups.
    #[must_use]
    pub fn reverse_url(&self) -> &Url {
        &self.reverse_url
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.reverse_url.clone())
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::geocoder(self.name(), format!("status {status}")));
        }

        let body: NominatimResponse = response.json().await?;
        Ok(body.into_name())
    }
}

/// Offline lookup of the nearest configured place.
#[derive(Debug, Clone)]
pub struct GazetteerGeocoder {
    places: Vec<NamedPlace>,
    max_distance_m: f64,
}

impl GazetteerGeocoder {
    /// Create a gazetteer over `places`, matching within `max_distance_m`.
    #[must_use]
    pub fn new(places: Vec<NamedPlace>, max_distance_m: f64) -> Self {
        Self {
            places,
            max_distance_m,
        }
    }

    /// The closest place within range of `coordinate`.
    #[must_use]
    pub fn nearest(&self, coordinate: Coordinate) -> Option<&NamedPlace> {
        self.places
            .iter()
            .map(|place| (place, place.coordinate().distance_m(&coordinate)))
            .filter(|(_, distance)| *distance <= self.max_distance_m)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(place, _)| place)
    }
}

#[async_trait]
impl ReverseGeocoder for GazetteerGeocoder {
    fn name(&self) -> &'static str {
        "gazetteer"
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        Ok(self.nearest(coordinate).map(|place| place.name.clone()))
    }
}

/// A geocoder that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeocoder;

#[async_trait]
impl ReverseGeocoder for NullGeocoder {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn reverse(&self, _coordinate: Coordinate) -> Result<Option<String>> {
        Ok(None)
    }
}
