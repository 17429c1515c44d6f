//! Storage layer for parkpatrol.
//!
//! This module provides the `SQLite`-backed report store: the single owner of
//! the alert history. Every committed create or delete is published on a
//! broadcast channel; commits from other connections to the same file show
//! up through [`ReportStore::data_version`].

mod feed;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::report::Report;

pub use feed::{ReportFeed, StoreChange, DEFAULT_POLL_INTERVAL};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Persistent store for patrol reports.
///
/// Reports are append-only: they can be created and deleted but never
/// edited. The store is meant to be shared behind an `Arc` for the life of
/// the process.
#[derive(Debug)]
pub struct ReportStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
    /// Change notifications for live views.
    changes: broadcast::Sender<StoreChange>,
}

impl ReportStore {
    /// Open or create a report database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Report store opened at {}", path.display());
        Ok(Self::from_connection(path, conn))
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self::from_connection(PathBuf::from(":memory:"), conn))
    }

    fn from_connection(path: PathBuf, conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path,
            conn: Mutex::new(conn),
            changes,
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register for change notifications.
    ///
    /// The receiver sees every change committed after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Record a new report timestamped now.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is invalid or the insert fails.
    pub fn create(&self, coordinate: Coordinate, location: Option<&str>) -> Result<Report> {
        self.create_at(coordinate, location, Utc::now())
    }

    /// Record a new report with an explicit timestamp.
    ///
    /// Timestamps are stored with microsecond precision; the returned report
    /// carries the stored value. Blank location names are stored as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is invalid or the insert fails.
    pub fn create_at(
        &self,
        coordinate: Coordinate,
        location: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<Report> {
        coordinate.validate()?;

        let stamp = format_timestamp(&timestamp);
        let location = location
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let id = {
            let conn = self.conn.lock();
            conn.execute(
                r"
                INSERT INTO reports (timestamp, latitude, longitude, location)
                VALUES (?1, ?2, ?3, ?4)
                ",
                params![
                    stamp,
                    coordinate.latitude,
                    coordinate.longitude,
                    location
                ],
            )?;
            conn.last_insert_rowid()
        };

        let report = Report {
            id,
            timestamp: parse_timestamp(&stamp).unwrap_or(timestamp),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            location,
        };

        debug!(id, location = report.display_location(), "Created report");
        self.publish(StoreChange::Created(report.clone()));
        Ok(report)
    }

    /// Get a report by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Report>> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                r"
                SELECT id, timestamp, latitude, longitude, location
                FROM reports WHERE id = ?1
                ",
                [id],
                Self::row_to_report,
            )
            .optional()?;
        Ok(result)
    }

    /// All reports, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Report>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r"
            SELECT id, timestamp, latitude, longitude, location
            FROM reports ORDER BY timestamp DESC, id DESC
            ",
        )?;

        let reports = stmt
            .query_map([], Self::row_to_report)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    /// The most recent `limit` reports, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<Report>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r"
            SELECT id, timestamp, latitude, longitude, location
            FROM reports ORDER BY timestamp DESC, id DESC LIMIT ?1
            ",
        )?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let reports = stmt
            .query_map([limit_i64], Self::row_to_report)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    /// The most recent report, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn latest(&self) -> Result<Option<Report>> {
        Ok(self.recent(1)?.into_iter().next())
    }

    /// Count stored reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a report by ID.
    ///
    /// Returns `true` if a report was deleted, `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .lock()
            .execute("DELETE FROM reports WHERE id = ?1", [id])?;

        if affected == 0 {
            debug!(id, "No report to delete");
            return Ok(false);
        }

        self.publish(StoreChange::Deleted(vec![id]));
        Ok(true)
    }

    /// Delete several reports in one transaction.
    ///
    /// IDs that don't exist are skipped. If any statement fails the whole
    /// batch is rolled back and the store is left unchanged.
    ///
    /// Returns the number of reports deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_many(&self, ids: &[i64]) -> Result<usize> {
        let deleted = {
            let mut conn = self.conn.lock();
            let tx = conn.transaction()?;
            let mut deleted = Vec::with_capacity(ids.len());
            {
                let mut stmt = tx.prepare("DELETE FROM reports WHERE id = ?1")?;
                for &id in ids {
                    if stmt.execute([id])? > 0 {
                        deleted.push(id);
                    }
                }
            }
            tx.commit()?;
            deleted
        };

        let count = deleted.len();
        if count < ids.len() {
            debug!(
                requested = ids.len(),
                deleted = count,
                "Some reports were already gone"
            );
        }
        if count > 0 {
            self.publish(StoreChange::Deleted(deleted));
        }
        Ok(count)
    }

    /// Delete every report.
    ///
    /// Returns the number of reports deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<usize> {
        let affected = self.conn.lock().execute("DELETE FROM reports", [])?;

        if affected > 0 {
            info!("Cleared {} reports from history", affected);
            self.publish(StoreChange::Cleared(affected));
        }
        Ok(affected)
    }

    /// Read a user setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a user setting, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    /// Write several settings in one transaction.
    ///
    /// Either every entry is written or, if any insert fails, none are.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_settings(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)")?;
            for &(key, value) in entries {
                stmt.execute((key, value))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove a user setting.
    ///
    /// Returns `true` if the key existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .lock()
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// The `SQLite` data version of this store's connection.
    ///
    /// The value changes whenever another connection, in this process or
    /// another, commits to the same database file. Commits made through this
    /// store leave it unchanged; those are announced on [`Self::subscribe`].
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma cannot be read.
    pub fn data_version(&self) -> Result<i64> {
        let version = self
            .conn
            .lock()
            .query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let total_reports = self.count()?;

        let (oldest, newest) = {
            let conn = self.conn.lock();
            let oldest: Option<String> = conn
                .query_row(
                    "SELECT timestamp FROM reports ORDER BY timestamp ASC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            let newest: Option<String> = conn
                .query_row(
                    "SELECT timestamp FROM reports ORDER BY timestamp DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            (oldest, newest)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            total_reports,
            oldest_report: oldest.as_deref().and_then(parse_timestamp),
            newest_report: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    fn publish(&self, change: StoreChange) {
        // No receivers is the normal case when nothing is watching.
        let _ = self.changes.send(change);
    }

    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
        let id: i64 = row.get(0)?;
        let timestamp_str: String = row.get(1)?;
        let latitude: f64 = row.get(2)?;
        let longitude: f64 = row.get(3)?;
        let location: Option<String> = row.get(4)?;

        let timestamp = parse_timestamp(&timestamp_str).unwrap_or_else(|| {
            warn!(id, timestamp = %timestamp_str, "Unreadable report timestamp");
            DateTime::<Utc>::default()
        });

        Ok(Report {
            id,
            timestamp,
            latitude,
            longitude,
            location,
        })
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Statistics about the report store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of reports stored.
    pub total_reports: i64,
    /// Timestamp of the oldest report.
    pub oldest_report: Option<DateTime<Utc>>,
    /// Timestamp of the newest report.
    pub newest_report: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
