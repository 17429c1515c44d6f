//! Device location sources.
//!
//! A [`LocationSource`] pushes [`LocationEvent`]s into a channel owned by the
//! map session. Platforms without a GPS feed use [`ReplayLocationSource`],
//! which plays back a configured track.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Whether the app may follow the device position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    #[default]
    NotDetermined,
    /// Tracking is allowed.
    Authorized,
    /// The user refused.
    Denied,
    /// Tracking is blocked by device policy.
    Restricted,
}

impl AuthorizationStatus {
    /// Whether position updates may be followed.
    #[must_use]
    pub fn allows_tracking(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDetermined => write!(f, "not determined"),
            Self::Authorized => write!(f, "authorized"),
            Self::Denied => write!(f, "denied"),
            Self::Restricted => write!(f, "restricted"),
        }
    }
}

/// A callback from the location service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    /// A new device position.
    Updated(Coordinate),
    /// The tracking permission changed.
    AuthorizationChanged(AuthorizationStatus),
}

/// A producer of device location events.
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the source is currently producing events.
    fn is_running(&self) -> bool;

    /// Produce events into `tx` until stopped or the receiver goes away.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is already running.
    async fn start(&self, tx: mpsc::UnboundedSender<LocationEvent>) -> Result<()>;

    /// Ask a running source to stop.
    fn stop(&self);
}

/// A cloneable handle that stops a location source from another task.
#[derive(Debug, Clone, Default)]
pub struct LocationHandle {
    stop_signal: Arc<AtomicBool>,
}

impl LocationHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the source to stop.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Clear the stop signal.
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }
}

/// Plays back a fixed list of positions.
///
/// Emits `AuthorizationChanged(status)` first, then, if the status allows
/// tracking, one `Updated` per point at `interval`.
#[derive(Debug)]
pub struct ReplayLocationSource {
    points: Vec<Coordinate>,
    interval: Duration,
    authorization: AuthorizationStatus,
    handle: LocationHandle,
    running: AtomicBool,
}

impl ReplayLocationSource {
    /// Create a source that replays `points` with authorization granted.
    #[must_use]
    pub fn new(points: Vec<Coordinate>, interval: Duration) -> Self {
        Self {
            points,
            interval,
            authorization: AuthorizationStatus::Authorized,
            handle: LocationHandle::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Report `status` instead of `Authorized` when starting.
    #[must_use]
    pub fn with_authorization(mut self, status: AuthorizationStatus) -> Self {
        self.authorization = status;
        self
    }

    /// A handle that can stop this source.
    #[must_use]
    pub fn handle(&self) -> LocationHandle {
        self.handle.clone()
    }

    async fn replay(&self, tx: &mpsc::UnboundedSender<LocationEvent>) {
        if tx
            .send(LocationEvent::AuthorizationChanged(self.authorization))
            .is_err()
        {
            return;
        }
        if !self.authorization.allows_tracking() {
            debug!(status = %self.authorization, "Replay not authorized, no positions sent");
            return;
        }

        let mut interval = tokio::time::interval(self.interval);
        for point in &self.points {
            interval.tick().await;
            if self.handle.should_stop() {
                debug!("Location replay stopped");
                return;
            }
            if tx.send(LocationEvent::Updated(*point)).is_err() {
                debug!("Location receiver dropped");
                return;
            }
        }
    }
}

#[async_trait::async_trait]
impl LocationSource for ReplayLocationSource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start(&self, tx: mpsc::UnboundedSender<LocationEvent>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::location_source(self.name(), "already running"));
        }
        self.handle.reset();

        info!(points = self.points.len(), "Starting location replay");
        self.replay(&tx).await;

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.handle.stop();
    }
}
