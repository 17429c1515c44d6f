//! `SQLite` schema definitions for parkpatrol.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the reports table.
pub const CREATE_REPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    location TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on timestamp for the history ordering.
pub const CREATE_TIMESTAMP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_reports_timestamp ON reports(timestamp DESC)
";

/// SQL statement to create the settings table for user-editable key-value pairs.
pub const CREATE_SETTINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for internal bookkeeping.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_REPORTS_TABLE,
    CREATE_TIMESTAMP_INDEX,
    CREATE_SETTINGS_TABLE,
    CREATE_METADATA_TABLE,
];
