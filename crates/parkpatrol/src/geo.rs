//! Geographic primitives shared by the store, the geocoder and the map session.
//!
//! Coordinates are plain WGS84 degrees. The map projection used to turn a
//! screen point into a coordinate is a linear mapping across the visible
//! region, which is accurate enough for the small spans a parking map shows.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius used for distance calculations, in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without validation.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if either component is out of range.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Self::new(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check that both components are finite and within range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] describing the offending component.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(())
    }

    /// Great-circle distance to `other` in metres (haversine).
    #[must_use]
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// True when either axis is exactly zero, the value an unset field
    /// leaves behind.
    #[must_use]
    pub fn has_zero_axis(&self) -> bool {
        self.latitude == 0.0 || self.longitude == 0.0
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Extent of a map region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// North-south extent in degrees.
    pub latitude_delta: f64,
    /// East-west extent in degrees.
    pub longitude_delta: f64,
}

/// The visible part of the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Center of the visible region.
    pub center: Coordinate,
    /// Visible extent around the center.
    pub span: Span,
}

impl Region {
    /// Create a region from a center and span.
    #[must_use]
    pub const fn new(center: Coordinate, span: Span) -> Self {
        Self { center, span }
    }

    /// Project a screen point inside `viewport` onto a coordinate.
    ///
    /// The left edge of the viewport maps to the western edge of the region
    /// and the top edge to the northern edge. Returns `None` when the point
    /// falls outside the viewport or the viewport is degenerate.
    #[must_use]
    pub fn coordinate_at(&self, point: ScreenPoint, viewport: Viewport) -> Option<Coordinate> {
        if !viewport.contains(point) {
            return None;
        }

        let fx = point.x / viewport.width;
        let fy = point.y / viewport.height;

        let west = self.center.longitude - self.span.longitude_delta / 2.0;
        let north = self.center.latitude + self.span.latitude_delta / 2.0;

        let longitude = wrap_longitude(west + fx * self.span.longitude_delta);
        let latitude = (north - fy * self.span.latitude_delta).clamp(-90.0, 90.0);

        Some(Coordinate::new(latitude, longitude))
    }

    /// Move the center, keeping the span.
    pub fn recenter(&mut self, center: Coordinate) {
        self.center = center;
    }
}

/// Normalise a longitude into `[-180, 180]`.
fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// A point in view coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Horizontal offset from the left edge.
    pub x: f64,
    /// Vertical offset from the top edge.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the map view on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether `point` lies within the viewport bounds.
    #[must_use]
    pub fn contains(&self, point: ScreenPoint) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && (0.0..=self.width).contains(&point.x)
            && (0.0..=self.height).contains(&point.y)
    }
}
