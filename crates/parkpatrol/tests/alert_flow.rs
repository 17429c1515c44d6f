//! End-to-end alert flow: tap, resolve, submit, watch, delete.

use std::sync::Arc;
use std::time::Duration;

use parkpatrol::config::{GeocoderProvider, NamedPlace};
use parkpatrol::{
    build_geocoder, Config, Coordinate, LocationSource, MapSession, ReplayLocationSource,
    ReportFeed, ReportStore, SessionSettings, SessionState, StoreChange, UNKNOWN_LOCATION,
};

fn gazetteer_config() -> Config {
    let mut config = Config::default();
    config.geocoder.provider = GeocoderProvider::Gazetteer;
    config.geocoder.places = vec![
        NamedPlace::new("CSUF Lot A", 33.8874, -117.8893),
        NamedPlace::new("CSUF East Parking", 33.8818, -117.8855),
    ];
    config.map.confirmation_ms = 50;
    config
}

fn session_for(config: &Config, store: &Arc<ReportStore>) -> MapSession {
    let geocoder = build_geocoder(&config.geocoder).unwrap();
    MapSession::new(
        Arc::clone(store),
        geocoder,
        SessionSettings::from_config(config),
    )
}

#[tokio::test]
async fn alert_appears_in_live_history_and_can_be_deleted() {
    let config = gazetteer_config();
    let store = Arc::new(ReportStore::open_in_memory().unwrap());
    let mut feed = ReportFeed::new(Arc::clone(&store)).unwrap();
    assert!(feed.is_empty());

    let mut session = session_for(&config, &store);
    session
        .tap_coordinate(Coordinate::new(33.8875, -117.8892))
        .unwrap();
    let report = session.submit().await.unwrap().expect("report created");

    assert_eq!(report.display_location(), "CSUF Lot A");
    assert_eq!(session.state(), SessionState::Submitted);

    let change = tokio::time::timeout(Duration::from_secs(5), feed.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change, Some(StoreChange::Created(report.clone())));
    assert_eq!(feed.latest(), Some(&report));

    assert!(store.delete(report.id).unwrap());
    feed.changed().await.unwrap();
    assert!(feed.is_empty());
    assert!(!store.delete(report.id).unwrap());
}

#[tokio::test]
async fn far_away_pin_gets_placeholder_name() {
    let config = gazetteer_config();
    let store = Arc::new(ReportStore::open_in_memory().unwrap());
    let mut session = session_for(&config, &store);

    session.tap_coordinate(Coordinate::new(40.0, -100.0)).unwrap();
    let report = session.submit().await.unwrap().unwrap();

    assert_eq!(report.display_location(), UNKNOWN_LOCATION);
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn reports_are_listed_newest_first() {
    let config = gazetteer_config();
    let store = Arc::new(ReportStore::open_in_memory().unwrap());
    let mut session = session_for(&config, &store);

    let mut ids = Vec::new();
    for latitude in [33.8874, 33.8818, 33.8800] {
        session
            .tap_coordinate(Coordinate::new(latitude, -117.8870))
            .unwrap();
        ids.push(session.submit().await.unwrap().unwrap().id);
    }

    let listed: Vec<i64> = store.list().unwrap().iter().map(|r| r.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn replayed_location_recenters_map() {
    let config = gazetteer_config();
    let store = Arc::new(ReportStore::open_in_memory().unwrap());
    let mut session = session_for(&config, &store);
    let here = Coordinate::new(33.8790, -117.8885);

    let source = ReplayLocationSource::new(vec![here], Duration::from_millis(1));
    source.start(session.location_sender()).await.unwrap();

    let updates = session.pump_pending();
    assert_eq!(updates.len(), 2);
    assert_eq!(session.region().center, here);
    assert!(session.pin().is_none());
}
