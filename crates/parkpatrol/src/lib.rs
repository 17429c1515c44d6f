//! `parkpatrol` - Map-based parking patrol alerts with a local report history
//!
//! This library provides the map interaction session that turns a pinned spot
//! into a stored report, the SQLite-backed report history it writes to, and
//! the reverse geocoding and location plumbing around them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod location;
pub mod logging;
pub mod map;
pub mod profile;
pub mod report;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use geo::{Coordinate, Region, ScreenPoint, Span, Viewport};
pub use geocode::{build_geocoder, resolve_name, ReverseGeocoder};
pub use location::{AuthorizationStatus, LocationEvent, LocationSource, ReplayLocationSource};
pub use logging::init_logging;
pub use map::{MapSession, SessionSettings, SessionState, SessionUpdate};
pub use profile::Profile;
pub use report::{Report, UNKNOWN_LOCATION};
pub use storage::{ReportFeed, ReportStore, StoreChange, StoreStats};
