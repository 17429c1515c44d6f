//! Core report types for parkpatrol.
//!
//! A [`Report`] is a single persisted patrol sighting: where it was, what the
//! place is called, and when it was sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Placeholder shown when a report has no resolved place name.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A patrol sighting stored in the report history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Row identity assigned by the store.
    pub id: i64,

    /// When the alert was sent.
    pub timestamp: DateTime<Utc>,

    /// Latitude of the reported spot.
    pub latitude: f64,

    /// Longitude of the reported spot.
    pub longitude: f64,

    /// Place name resolved when the alert was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Report {
    /// The reported position.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Place name for display, falling back to [`UNKNOWN_LOCATION`].
    #[must_use]
    pub fn display_location(&self) -> &str {
        match self.location.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNKNOWN_LOCATION,
        }
    }

    /// Whether the report carries a real position.
    ///
    /// A zero latitude or longitude is treated as unset, so reports on the
    /// equator or the prime meridian count as having no position.
    #[must_use]
    pub fn has_position(&self) -> bool {
        !self.coordinate().has_zero_axis()
    }
}
