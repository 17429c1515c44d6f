//! Live views over the report store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::report::Report;

use super::ReportStore;

/// A committed change to the report history.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A report was created.
    Created(Report),
    /// These reports were deleted.
    Deleted(Vec<i64>),
    /// The whole history was cleared; carries the number removed.
    Cleared(usize),
}

/// How often a feed checks for commits made by other connections.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A sorted report list that follows the store.
///
/// The feed subscribes before taking its first snapshot, so no commit can
/// slip between the two. Each call to [`ReportFeed::changed`] waits for the
/// next commit and re-queries the store. Commits through the shared
/// [`ReportStore`] arrive on its broadcast channel; commits from another
/// connection, such as a second `parkpatrol` process writing the same file,
/// are found by polling [`ReportStore::data_version`].
#[derive(Debug)]
pub struct ReportFeed {
    store: Arc<ReportStore>,
    changes: broadcast::Receiver<StoreChange>,
    reports: Vec<Report>,
    data_version: i64,
    poll_interval: Duration,
    poll: Option<Interval>,
}

impl ReportFeed {
    /// Subscribe to `store` and load the current history.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial query fails.
    pub fn new(store: Arc<ReportStore>) -> Result<Self> {
        let changes = store.subscribe();
        let data_version = store.data_version()?;
        let reports = store.list()?;
        Ok(Self {
            store,
            changes,
            reports,
            data_version,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll: None,
        })
    }

    /// Check for commits from other connections every `interval` instead of
    /// [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self.poll = None;
        self
    }

    /// The reports as of the last refresh, most recent first.
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// The most recent report as of the last refresh.
    #[must_use]
    pub fn latest(&self) -> Option<&Report> {
        self.reports.first()
    }

    /// Whether the history was empty at the last refresh.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Re-query the store now.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn refresh(&mut self) -> Result<&[Report]> {
        self.data_version = self.store.data_version()?;
        self.reports = self.store.list()?;
        Ok(&self.reports)
    }

    /// Wait for the next committed change, then refresh.
    ///
    /// Returns the change that triggered the refresh, or `None` when the
    /// change is not known in detail: another connection committed, or
    /// notifications were dropped because this feed fell behind. The list is
    /// refreshed in every case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedClosed`] if the store's channel is gone, or a
    /// storage error if the version check or refresh query fails.
    pub async fn changed(&mut self) -> Result<Option<StoreChange>> {
        let period = self.poll_interval;
        let poll = self.poll.get_or_insert_with(|| {
            let mut poll = tokio::time::interval(period);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
            poll
        });

        let change = loop {
            tokio::select! {
                received = self.changes.recv() => match received {
                    Ok(change) => break Some(change),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Report feed fell behind, resynchronising");
                        break None;
                    }
                    Err(RecvError::Closed) => return Err(Error::FeedClosed),
                },
                _ = poll.tick() => {
                    let version = self.store.data_version()?;
                    if version != self.data_version {
                        debug!("Report store changed by another connection");
                        break None;
                    }
                }
            }
        };

        self.refresh()?;
        debug!(count = self.reports.len(), "Report feed refreshed");
        Ok(change)
    }
}
