//! Error types for parkpatrol.
//!
//! This module defines all error types used throughout the parkpatrol crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for parkpatrol operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Report Errors ===
    /// A coordinate was outside the valid range.
    #[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        /// The rejected latitude.
        latitude: f64,
        /// The rejected longitude.
        longitude: f64,
        /// Which constraint was violated.
        reason: &'static str,
    },

    /// The live report feed lost its change channel.
    #[error("report feed closed")]
    FeedClosed,

    // === Profile Errors ===
    /// A profile field failed validation.
    #[error("invalid profile field '{field}': {message}")]
    InvalidProfile {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Geocoding Errors ===
    /// The reverse geocoder could not produce an answer.
    #[error("geocoder '{name}' failed: {message}")]
    Geocoder {
        /// Name of the geocoder backend.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Location Errors ===
    /// A location source failed.
    #[error("location source '{name}' failed: {message}")]
    LocationSource {
        /// Name of the location source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for parkpatrol operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a geocoder error.
    #[must_use]
    pub fn geocoder(name: &'static str, message: impl Into<String>) -> Self {
        Self::Geocoder {
            name,
            message: message.into(),
        }
    }

    /// Create a location source error.
    #[must_use]
    pub fn location_source(name: &'static str, message: impl Into<String>) -> Self {
        Self::LocationSource {
            name,
            message: message.into(),
        }
    }

    /// Create a profile validation error.
    #[must_use]
    pub fn invalid_profile(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidProfile {
            field,
            message: message.into(),
        }
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. } | Self::DatabaseQuery(_) | Self::DatabaseMigration { .. }
        )
    }
}
