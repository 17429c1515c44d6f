//! The map screen's interaction session.
//!
//! A [`MapSession`] turns taps into a pinned coordinate, resolves a place
//! name for it in the background and, on submit, records a [`Report`].
//!
//! Background work (lookups, the confirmation timer) runs in spawned tasks
//! that report back over a channel; location callbacks arrive on a second
//! channel. All of it is applied by [`MapSession::next_event`], so session
//! state is only ever mutated by its owner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::geo::{Coordinate, Region, ScreenPoint, Viewport};
use crate::geocode::{resolve_name, ReverseGeocoder};
use crate::location::{AuthorizationStatus, LocationEvent};
use crate::report::Report;
use crate::storage::ReportStore;

/// Banner text shown after an alert is stored.
pub const CONFIRMATION_MESSAGE: &str = "Alert Sent Successfully!";

/// Tunables for a [`MapSession`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Region shown when the session starts.
    pub region: Region,
    /// Size of the map view.
    pub viewport: Viewport,
    /// How long the confirmation banner stays visible.
    pub confirmation: Duration,
    /// Upper bound on a single reverse lookup.
    pub geocoder_timeout: Duration,
}

impl SessionSettings {
    /// Settings taken from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            region: config.default_region(),
            viewport: config.viewport(),
            confirmation: config.confirmation_duration(),
            geocoder_timeout: config.geocoder_timeout(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where the session is in the tap, resolve, submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No pin; submit does nothing.
    #[default]
    Idle,
    /// A pin is placed and its name lookup is in flight.
    PinPlaced,
    /// The pin has a name and can be submitted.
    NameResolved,
    /// A report was stored and the confirmation is showing.
    Submitted,
}

/// What a processed event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The current pin's lookup finished with this name.
    NameResolved(String),
    /// A lookup finished for a pin that has since been replaced.
    LookupDiscarded,
    /// The confirmation banner was hidden.
    BannerHidden,
    /// The map was recentred on the device position.
    RegionChanged(Region),
    /// The location permission changed.
    AuthorizationChanged(AuthorizationStatus),
    /// The event had no visible effect.
    Ignored,
}

#[derive(Debug, Clone)]
struct Pin {
    coordinate: Coordinate,
    token: u64,
    name: Option<String>,
}

#[derive(Debug)]
enum SessionEvent {
    LookupFinished { token: u64, name: String },
    BannerExpired { token: u64 },
}

/// State behind the map screen.
pub struct MapSession {
    store: Arc<ReportStore>,
    geocoder: Arc<dyn ReverseGeocoder>,
    settings: SessionSettings,
    region: Region,
    state: SessionState,
    pin: Option<Pin>,
    lookup_token: u64,
    banner: Option<&'static str>,
    banner_token: u64,
    banner_task: Option<JoinHandle<()>>,
    authorization: AuthorizationStatus,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    location_tx: mpsc::UnboundedSender<LocationEvent>,
    location_rx: mpsc::UnboundedReceiver<LocationEvent>,
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("geocoder", &self.geocoder.name())
            .field("region", &self.region)
            .field("state", &self.state)
            .field("pin", &self.pin)
            .field("banner", &self.banner)
            .field("authorization", &self.authorization)
            .finish_non_exhaustive()
    }
}

impl MapSession {
    /// Create an idle session over `store`.
    #[must_use]
    pub fn new(
        store: Arc<ReportStore>,
        geocoder: Arc<dyn ReverseGeocoder>,
        settings: SessionSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (location_tx, location_rx) = mpsc::unbounded_channel();

        Self {
            store,
            geocoder,
            region: settings.region,
            settings,
            state: SessionState::Idle,
            pin: None,
            lookup_token: 0,
            banner: None,
            banner_token: 0,
            banner_task: None,
            authorization: AuthorizationStatus::NotDetermined,
            events_tx,
            events_rx,
            location_tx,
            location_rx,
        }
    }

    /// Sender for location callbacks; hand this to a
    /// [`LocationSource`](crate::location::LocationSource).
    #[must_use]
    pub fn location_sender(&self) -> mpsc::UnboundedSender<LocationEvent> {
        self.location_tx.clone()
    }

    /// Place the pin at a screen point.
    ///
    /// Returns the pinned coordinate, or `None` if the point is outside the
    /// map view.
    pub fn tap(&mut self, point: ScreenPoint) -> Option<Coordinate> {
        let Some(coordinate) = self.region.coordinate_at(point, self.settings.viewport) else {
            debug!(x = point.x, y = point.y, "Tap outside the map ignored");
            return None;
        };
        self.place_pin(coordinate);
        Some(coordinate)
    }

    /// Place the pin at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is out of range; the current pin
    /// is left alone.
    pub fn tap_coordinate(&mut self, coordinate: Coordinate) -> Result<()> {
        coordinate.validate()?;
        self.place_pin(coordinate);
        Ok(())
    }

    fn place_pin(&mut self, coordinate: Coordinate) {
        self.lookup_token += 1;
        let token = self.lookup_token;

        self.pin = Some(Pin {
            coordinate,
            token,
            name: None,
        });
        self.state = SessionState::PinPlaced;
        self.region.recenter(coordinate);
        debug!(%coordinate, token, "Pin placed");

        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.events_tx.clone();
        let timeout = self.settings.geocoder_timeout;
        tokio::spawn(async move {
            let name = resolve_name(geocoder.as_ref(), coordinate, timeout).await;
            // The session may be gone; nothing to deliver to then.
            let _ = tx.send(SessionEvent::LookupFinished { token, name });
        });
    }

    /// Send an alert for the current pin.
    ///
    /// With no pin this does nothing and returns `Ok(None)`. If the name
    /// lookup is still running, waits for it first; lookups are bounded by
    /// the geocoder timeout. On success the pin is cleared and the
    /// confirmation banner is shown.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the report could not be saved. The pin
    /// is kept so the user can try again and no banner is shown.
    pub async fn submit(&mut self) -> Result<Option<Report>> {
        loop {
            match self.pin.as_ref().map(|pin| pin.name.is_some()) {
                None => {
                    debug!("Submit without a pin ignored");
                    return Ok(None);
                }
                Some(true) => break,
                Some(false) => {
                    self.next_event().await;
                }
            }
        }

        let Some(pin) = self.pin.clone() else {
            return Ok(None);
        };
        let name = pin.name.as_deref();

        match self.store.create(pin.coordinate, name) {
            Ok(report) => {
                info!(
                    id = report.id,
                    location = report.display_location(),
                    coordinate = %pin.coordinate,
                    "Alert sent"
                );
                self.pin = None;
                self.state = SessionState::Submitted;
                self.show_banner();
                Ok(Some(report))
            }
            Err(e) => {
                error!(error = %e, coordinate = %pin.coordinate, "Failed to save report");
                Err(e)
            }
        }
    }

    fn show_banner(&mut self) {
        if let Some(task) = self.banner_task.take() {
            task.abort();
        }

        self.banner_token += 1;
        let token = self.banner_token;
        self.banner = Some(CONFIRMATION_MESSAGE);

        let tx = self.events_tx.clone();
        let duration = self.settings.confirmation;
        self.banner_task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(SessionEvent::BannerExpired { token });
        }));
    }

    /// Wait for the next background event and apply it.
    pub async fn next_event(&mut self) -> SessionUpdate {
        tokio::select! {
            Some(event) = self.events_rx.recv() => self.apply(event),
            Some(event) = self.location_rx.recv() => self.apply_location(event),
            else => SessionUpdate::Ignored,
        }
    }

    /// Apply every event that is already waiting, without blocking.
    pub fn pump_pending(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            updates.push(self.apply(event));
        }
        while let Ok(event) = self.location_rx.try_recv() {
            updates.push(self.apply_location(event));
        }
        updates
    }

    fn apply(&mut self, event: SessionEvent) -> SessionUpdate {
        match event {
            SessionEvent::LookupFinished { token, name } => match self.pin.as_mut() {
                Some(pin) if pin.token == token => {
                    debug!(token, name = %name, "Pin name resolved");
                    pin.name = Some(name.clone());
                    self.state = SessionState::NameResolved;
                    SessionUpdate::NameResolved(name)
                }
                _ => {
                    debug!(token, "Discarding stale lookup");
                    SessionUpdate::LookupDiscarded
                }
            },
            SessionEvent::BannerExpired { token } => {
                if token != self.banner_token || self.banner.is_none() {
                    return SessionUpdate::Ignored;
                }
                self.banner = None;
                self.banner_task = None;
                if self.state == SessionState::Submitted {
                    self.state = SessionState::Idle;
                }
                SessionUpdate::BannerHidden
            }
        }
    }

    fn apply_location(&mut self, event: LocationEvent) -> SessionUpdate {
        match event {
            LocationEvent::AuthorizationChanged(status) => {
                self.authorization = status;
                match status {
                    AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                        warn!(%status, "Location services denied or restricted");
                    }
                    AuthorizationStatus::Authorized => info!("Location tracking started"),
                    AuthorizationStatus::NotDetermined => {}
                }
                SessionUpdate::AuthorizationChanged(status)
            }
            LocationEvent::Updated(coordinate) => {
                if !self.authorization.allows_tracking() {
                    debug!(%coordinate, "Location update without authorization ignored");
                    return SessionUpdate::Ignored;
                }
                if let Err(e) = coordinate.validate() {
                    warn!(error = %e, "Ignoring invalid location update");
                    return SessionUpdate::Ignored;
                }
                self.region.recenter(coordinate);
                SessionUpdate::RegionChanged(self.region)
            }
        }
    }

    /// Current step of the cycle.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The visible map region.
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// The pinned coordinate, if any.
    #[must_use]
    pub fn pin(&self) -> Option<Coordinate> {
        self.pin.as_ref().map(|pin| pin.coordinate)
    }

    /// Resolved name of the pin, or empty while unresolved or unpinned.
    #[must_use]
    pub fn location_label(&self) -> &str {
        self.pin
            .as_ref()
            .and_then(|pin| pin.name.as_deref())
            .unwrap_or("")
    }

    /// `"<lat>, <lon>"` of the pin, or empty with no pin.
    #[must_use]
    pub fn coordinates_text(&self) -> String {
        self.pin()
            .map(|coordinate| coordinate.to_string())
            .unwrap_or_default()
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.pin.is_some()
    }

    /// The confirmation banner text while it is visible.
    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner
    }

    /// Last known location permission.
    #[must_use]
    pub fn authorization(&self) -> AuthorizationStatus {
        self.authorization
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        if let Some(task) = self.banner_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use chrono::{SubsecRound, Utc};

    use super::*;
    use crate::geo::Span;
    use crate::geocode::NullGeocoder;
    use crate::report::UNKNOWN_LOCATION;

    type Script = Box<dyn Fn(Coordinate) -> (Duration, Option<String>) + Send + Sync>;

    /// Answers each lookup after a per-coordinate delay.
    struct ScriptedGeocoder(Script);

    #[async_trait]
    impl ReverseGeocoder for ScriptedGeocoder {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
            let (delay, name) = (self.0)(coordinate);
            tokio::time::sleep(delay).await;
            Ok(name)
        }
    }

    fn named(name: &'static str) -> Arc<dyn ReverseGeocoder> {
        Arc::new(ScriptedGeocoder(Box::new(move |_: Coordinate| {
            (Duration::ZERO, Some(name.to_string()))
        })))
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            region: Region::new(
                Coordinate::new(33.8818, -117.8855),
                Span {
                    latitude_delta: 0.01,
                    longitude_delta: 0.01,
                },
            ),
            viewport: Viewport::new(100.0, 100.0),
            confirmation: Duration::from_millis(50),
            geocoder_timeout: Duration::from_secs(2),
        }
    }

    fn session(geocoder: Arc<dyn ReverseGeocoder>) -> (MapSession, Arc<ReportStore>) {
        let store = Arc::new(ReportStore::open_in_memory().unwrap());
        let session = MapSession::new(Arc::clone(&store), geocoder, settings());
        (session, store)
    }

    async fn next(session: &mut MapSession) -> SessionUpdate {
        tokio::time::timeout(Duration::from_secs(5), session.next_event())
            .await
            .expect("no session event arrived")
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let (session, _) = session(named("Lot A"));

        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.can_submit());
        assert_eq!(session.location_label(), "");
        assert_eq!(session.coordinates_text(), "");
        assert!(session.banner().is_none());
        assert_eq!(session.region(), settings().region);
    }

    #[tokio::test]
    async fn test_submit_without_pin_is_noop() {
        let (mut session, store) = session(named("Lot A"));

        assert!(session.submit().await.unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.banner().is_none());
    }

    #[tokio::test]
    async fn test_tap_then_submit_creates_one_report() {
        let (mut session, store) = session(named("CSUF Lot A"));
        let target = Coordinate::new(33.88, -117.88);

        let before = Utc::now().trunc_subsecs(6);
        session.tap_coordinate(target).unwrap();
        assert_eq!(session.state(), SessionState::PinPlaced);
        assert!(session.can_submit());
        assert_eq!(session.coordinates_text(), target.to_string());

        let report = session.submit().await.unwrap().expect("report created");
        let after = Utc::now();

        assert_eq!(report.latitude, 33.88);
        assert_eq!(report.longitude, -117.88);
        assert_eq!(report.display_location(), "CSUF Lot A");
        assert!(report.timestamp >= before && report.timestamp <= after);

        assert_eq!(store.list().unwrap(), vec![report]);
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(session.banner(), Some(CONFIRMATION_MESSAGE));
        assert!(session.pin().is_none());
        assert!(!session.can_submit());
    }

    #[tokio::test]
    async fn test_name_resolves_before_submit() {
        let (mut session, _) = session(named("CSUF East Parking"));
        session.tap_coordinate(Coordinate::new(33.8818, -117.8855)).unwrap();

        let update = next(&mut session).await;
        assert_eq!(
            update,
            SessionUpdate::NameResolved("CSUF East Parking".to_string())
        );
        assert_eq!(session.state(), SessionState::NameResolved);
        assert_eq!(session.location_label(), "CSUF East Parking");
    }

    #[tokio::test]
    async fn test_no_geocoder_result_uses_placeholder() {
        let (mut session, store) = session(Arc::new(NullGeocoder));
        session.tap_coordinate(Coordinate::new(33.88, -117.88)).unwrap();

        let report = session.submit().await.unwrap().unwrap();
        assert_eq!(report.display_location(), UNKNOWN_LOCATION);
        assert_eq!(
            store.latest().unwrap().unwrap().display_location(),
            UNKNOWN_LOCATION
        );
    }

    #[tokio::test]
    async fn test_slow_geocoder_is_bounded_by_timeout() {
        let geocoder: Arc<dyn ReverseGeocoder> = Arc::new(ScriptedGeocoder(Box::new(|_: Coordinate| {
            (Duration::from_secs(60), Some("Too Late".to_string()))
        })));
        let store = Arc::new(ReportStore::open_in_memory().unwrap());
        let mut settings = settings();
        settings.geocoder_timeout = Duration::from_millis(50);
        let mut session = MapSession::new(Arc::clone(&store), geocoder, settings);

        session.tap_coordinate(Coordinate::new(33.88, -117.88)).unwrap();
        let report = tokio::time::timeout(Duration::from_secs(5), session.submit())
            .await
            .expect("submit blocked on the lookup")
            .unwrap()
            .unwrap();

        assert_eq!(report.display_location(), UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn test_stale_lookup_does_not_overwrite_newer_pin() {
        let geocoder: Arc<dyn ReverseGeocoder> =
            Arc::new(ScriptedGeocoder(Box::new(|coordinate: Coordinate| {
                if coordinate.latitude > 34.0 {
                    (Duration::from_millis(200), Some("Old Lot".to_string()))
                } else {
                    (Duration::ZERO, Some("New Lot".to_string()))
                }
            })));
        let (mut session, store) = session(geocoder);

        session.tap_coordinate(Coordinate::new(34.5, -117.88)).unwrap();
        session.tap_coordinate(Coordinate::new(33.88, -117.88)).unwrap();

        assert_eq!(
            next(&mut session).await,
            SessionUpdate::NameResolved("New Lot".to_string())
        );
        assert_eq!(next(&mut session).await, SessionUpdate::LookupDiscarded);
        assert_eq!(session.location_label(), "New Lot");
        assert_eq!(session.pin(), Some(Coordinate::new(33.88, -117.88)));

        let report = session.submit().await.unwrap().unwrap();
        assert_eq!(report.display_location(), "New Lot");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_banner_expires_back_to_idle() {
        let (mut session, _) = session(named("Lot A"));
        session.tap_coordinate(Coordinate::new(33.88, -117.88)).unwrap();
        session.submit().await.unwrap().unwrap();
        assert!(session.banner().is_some());

        assert_eq!(next(&mut session).await, SessionUpdate::BannerHidden);
        assert!(session.banner().is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_banner_expiry_keeps_new_pin() {
        let (mut session, _) = session(named("Lot A"));
        session.tap_coordinate(Coordinate::new(33.88, -117.88)).unwrap();
        session.submit().await.unwrap().unwrap();

        session.tap_coordinate(Coordinate::new(33.89, -117.89)).unwrap();
        assert_eq!(
            next(&mut session).await,
            SessionUpdate::NameResolved("Lot A".to_string())
        );
        assert_eq!(next(&mut session).await, SessionUpdate::BannerHidden);
        assert_eq!(session.state(), SessionState::NameResolved);
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn test_second_submit_restarts_banner() {
        let (mut session, store) = session(named("Lot A"));
        for latitude in [33.88, 33.89] {
            session.tap_coordinate(Coordinate::new(latitude, -117.88)).unwrap();
            session.submit().await.unwrap().unwrap();
        }
        assert_eq!(store.count().unwrap(), 2);

        // Only the second timer is still alive, so exactly one hide arrives.
        assert_eq!(next(&mut session).await, SessionUpdate::BannerHidden);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(session.pump_pending().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_pin_and_shows_no_banner() {
        let db_path: PathBuf = std::env::temp_dir().join(format!(
            "parkpatrol_map_failure_{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&db_path);

        let store = Arc::new(ReportStore::open(&db_path).unwrap());
        let mut session = MapSession::new(Arc::clone(&store), named("Lot A"), settings());
        {
            let other = rusqlite::Connection::open(&db_path).unwrap();
            other.execute_batch("DROP TABLE reports;").unwrap();
        }

        let target = Coordinate::new(33.88, -117.88);
        session.tap_coordinate(target).unwrap();
        assert!(session.submit().await.is_err());

        assert!(session.banner().is_none());
        assert_eq!(session.pin(), Some(target));
        assert_eq!(session.state(), SessionState::NameResolved);
        assert!(session.can_submit());

        drop(session);
        drop(store);
        let _ = std::fs::remove_file(&db_path);
    }

    #[tokio::test]
    async fn test_screen_tap_projects_and_recenters() {
        let (mut session, _) = session(named("Lot A"));

        let center = session.tap(ScreenPoint::new(50.0, 50.0)).unwrap();
        assert!((center.latitude - 33.8818).abs() < 1e-9);
        assert!((center.longitude + 117.8855).abs() < 1e-9);

        let corner = session.tap(ScreenPoint::new(0.0, 0.0)).unwrap();
        // The region recentred on the first pin, so the corner is its north-west.
        assert!((corner.latitude - (33.8818 + 0.005)).abs() < 1e-9);
        assert!((corner.longitude - (-117.8855 - 0.005)).abs() < 1e-9);
        assert_eq!(session.region().center, corner);
    }

    #[tokio::test]
    async fn test_tap_outside_view_is_ignored() {
        let (mut session, _) = session(named("Lot A"));

        assert!(session.tap(ScreenPoint::new(150.0, 10.0)).is_none());
        assert!(session.tap(ScreenPoint::new(-1.0, 10.0)).is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_tap_coordinate_rejected() {
        let (mut session, _) = session(named("Lot A"));
        session.tap_coordinate(Coordinate::new(33.88, -117.88)).unwrap();

        assert!(session.tap_coordinate(Coordinate::new(120.0, 0.0)).is_err());
        assert_eq!(session.pin(), Some(Coordinate::new(33.88, -117.88)));
    }

    #[tokio::test]
    async fn test_location_updates_follow_authorization() {
        let (mut session, _) = session(named("Lot A"));
        let tx = session.location_sender();
        let here = Coordinate::new(33.8830, -117.8870);

        tx.send(LocationEvent::Updated(here)).unwrap();
        assert_eq!(next(&mut session).await, SessionUpdate::Ignored);
        assert_eq!(session.region(), settings().region);

        tx.send(LocationEvent::AuthorizationChanged(
            AuthorizationStatus::Authorized,
        ))
        .unwrap();
        tx.send(LocationEvent::Updated(here)).unwrap();
        assert_eq!(
            next(&mut session).await,
            SessionUpdate::AuthorizationChanged(AuthorizationStatus::Authorized)
        );
        let SessionUpdate::RegionChanged(region) = next(&mut session).await else {
            panic!("expected a region change");
        };
        assert_eq!(region.center, here);
        assert_eq!(region.span, settings().region.span);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_denied_location_keeps_region() {
        let (mut session, _) = session(named("Lot A"));
        let tx = session.location_sender();

        tx.send(LocationEvent::AuthorizationChanged(
            AuthorizationStatus::Denied,
        ))
        .unwrap();
        tx.send(LocationEvent::Updated(Coordinate::new(40.0, -100.0)))
            .unwrap();

        let updates = session.pump_pending();
        assert_eq!(
            updates,
            vec![
                SessionUpdate::AuthorizationChanged(AuthorizationStatus::Denied),
                SessionUpdate::Ignored,
            ]
        );
        assert_eq!(session.region(), settings().region);
        assert_eq!(session.authorization(), AuthorizationStatus::Denied);
    }

    #[tokio::test]
    async fn test_location_updates_do_not_touch_pin() {
        let (mut session, _) = session(named("Lot A"));
        let tx = session.location_sender();
        let pin = Coordinate::new(33.88, -117.88);
        session.tap_coordinate(pin).unwrap();

        tx.send(LocationEvent::AuthorizationChanged(
            AuthorizationStatus::Authorized,
        ))
        .unwrap();
        tx.send(LocationEvent::Updated(Coordinate::new(33.0, -117.0)))
            .unwrap();
        session.pump_pending();

        assert_eq!(session.pin(), Some(pin));
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::default();
        let settings = SessionSettings::from_config(&config);

        assert_eq!(settings.confirmation, Duration::from_secs(2));
        assert_eq!(settings.region.center, Coordinate::new(33.8818, -117.8855));
        assert_eq!(SessionSettings::default(), settings);
    }
}
