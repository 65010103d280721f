use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use estate_map_search::controller::SearchIssue;
use estate_map_search::{
    Catalog, DeviceLocator, FixedLocator, GeoPoint, Geocoder, LocationError, MapSearchError,
    MapSearchSession, MapSearchSnapshot, PlaceCandidate, SearchConfig, SearchConfigBuilder, Status,
};
use tokio::sync::watch;

const MUMBAI: GeoPoint = GeoPoint {
    latitude: 19.0760,
    longitude: 72.8777,
};
const KORAMANGALA: GeoPoint = GeoPoint {
    latitude: 12.9352,
    longitude: 77.6245,
};

/// Geocoder answering from a fixed table after a per-query delay
#[derive(Default)]
struct ScriptedGeocoder {
    answers: HashMap<&'static str, (Duration, Result<Vec<PlaceCandidate>, &'static str>)>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    fn answer(mut self, query: &'static str, delay_secs: u64, places: &[(&str, GeoPoint)]) -> Self {
        let candidates = places
            .iter()
            .map(|(name, point)| PlaceCandidate {
                display_name: name.to_string(),
                point: *point,
            })
            .collect();
        self.answers
            .insert(query, (Duration::from_secs(delay_secs), Ok(candidates)));
        self
    }

    fn fail(mut self, query: &'static str, reason: &'static str) -> Self {
        self.answers.insert(query, (Duration::from_millis(10), Err(reason)));
        self
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn lookup(&self, query: &str) -> anyhow::Result<Vec<PlaceCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((delay, answer)) = self.answers.get(query) else {
            return Ok(Vec::new());
        };
        tokio::time::sleep(*delay).await;
        answer.clone().map_err(|reason| anyhow::anyhow!(reason))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Locator that answers after a delay
struct SlowLocator {
    delay: Duration,
    answer: Result<GeoPoint, LocationError>,
}

#[async_trait]
impl DeviceLocator for SlowLocator {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        tokio::time::sleep(self.delay).await;
        self.answer
    }
}

fn config() -> SearchConfig {
    SearchConfigBuilder::new()
        .location_timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

fn start(
    geocoder: ScriptedGeocoder,
    locator: impl DeviceLocator + 'static,
) -> (MapSearchSession, Arc<ScriptedGeocoder>) {
    let geocoder = Arc::new(geocoder);
    let session = MapSearchSession::spawn(
        &config(),
        Catalog::global().clone(),
        geocoder.clone(),
        Arc::new(locator),
    )
    .unwrap();
    (session, geocoder)
}

async fn wait_until(
    updates: &mut watch::Receiver<MapSearchSnapshot>,
    done: impl FnMut(&MapSearchSnapshot) -> bool,
) -> MapSearchSnapshot {
    let snapshot = tokio::time::timeout(Duration::from_secs(60), updates.wait_for(done))
        .await
        .expect("session did not reach the expected state")
        .expect("session stopped");
    snapshot.clone()
}

fn ids(snapshot: &MapSearchSnapshot) -> Vec<u32> {
    snapshot.results.iter().map(|p| p.id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_click_then_radius_change() {
    let (session, geocoder) = start(ScriptedGeocoder::default(), FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.click_map(MUMBAI);
    let located = wait_until(&mut updates, |s| s.status == Status::Located).await;
    assert_eq!(ids(&located), vec![1, 2, 3]);
    assert_eq!(located.selection.unwrap().point, MUMBAI);

    session.set_radius(25.0).unwrap();
    let wider = wait_until(&mut updates, |s| s.results.len() == 5).await;
    assert_eq!(wider.status, Status::Located);
    assert_eq!(wider.selection.unwrap().point, MUMBAI);
    assert_eq!(wider.selection.unwrap().radius_km.km(), 25.0);
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_radius_is_rejected_up_front() {
    let (session, _) = start(ScriptedGeocoder::default(), FixedLocator::unavailable());
    assert!(matches!(
        session.set_radius(0.0),
        Err(MapSearchError::InvalidRadius(_))
    ));
    assert!(session.set_radius(-5.0).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_text_search_and_selection() {
    let geocoder = ScriptedGeocoder::default().answer(
        "Koramangala",
        1,
        &[
            ("Koramangala, Bengaluru, Karnataka, India", KORAMANGALA),
            ("Koramangala 4th Block, Bengaluru", KORAMANGALA),
        ],
    );
    let (session, _) = start(geocoder, FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.search_text("  Koramangala ").unwrap();
    let found = wait_until(&mut updates, |s| !s.candidates.is_empty()).await;
    assert_eq!(found.status, Status::Searching);
    assert_eq!(found.candidates.len(), 2);
    assert!(found.selection.is_none());

    session.select_candidate(0);
    let located = wait_until(&mut updates, |s| s.status == Status::Located).await;
    assert_eq!(ids(&located), vec![6, 7]);
    assert!(located.candidates.is_empty());
    assert_eq!(located.result_ids_param(), "6,7");
}

#[tokio::test(start_paused = true)]
async fn test_blank_query_never_reaches_geocoder() {
    let (session, geocoder) = start(ScriptedGeocoder::default(), FixedLocator::unavailable());
    assert!(matches!(
        session.search_text(" \n "),
        Err(MapSearchError::EmptyQuery)
    ));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.snapshot().status, Status::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_empty_results_report_no_results() {
    let (session, _) = start(ScriptedGeocoder::default(), FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.search_text("Atlantis").unwrap();
    let idle = wait_until(&mut updates, |s| s.last_error.is_some()).await;
    assert_eq!(idle.status, Status::Idle);
    assert_eq!(idle.last_error, Some(SearchIssue::NoResults));
    assert_eq!(idle.message(), "No places matched your search");
}

#[tokio::test(start_paused = true)]
async fn test_geocoding_failure_is_not_a_fault() {
    let geocoder = ScriptedGeocoder::default().fail("Powai", "connection reset by peer");
    let (session, _) = start(geocoder, FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.click_map(MUMBAI);
    wait_until(&mut updates, |s| s.status == Status::Located).await;

    session.search_text("Powai").unwrap();
    let failed = wait_until(&mut updates, |s| s.last_error.is_some()).await;
    assert_eq!(failed.status, Status::Idle);
    assert!(failed.candidates.is_empty());
    assert!(failed.results.is_empty());
    assert!(!failed.message().is_empty());
    assert!(matches!(
        failed.last_error,
        Some(SearchIssue::SearchFailed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_use_my_location() {
    let (session, _) = start(ScriptedGeocoder::default(), FixedLocator::at(KORAMANGALA));
    let mut updates = session.subscribe();

    session.use_my_location();
    let located = wait_until(&mut updates, |s| s.status == Status::Located).await;
    assert_eq!(located.selection.unwrap().point, KORAMANGALA);
    assert_eq!(ids(&located), vec![6, 7]);
}

#[tokio::test(start_paused = true)]
async fn test_location_denied() {
    let (session, _) = start(
        ScriptedGeocoder::default(),
        FixedLocator::failing(LocationError::PermissionDenied),
    );
    let mut updates = session.subscribe();

    session.use_my_location();
    let idle = wait_until(&mut updates, |s| s.last_error.is_some()).await;
    assert_eq!(idle.status, Status::Idle);
    assert_eq!(
        idle.last_error,
        Some(SearchIssue::Location(LocationError::PermissionDenied))
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_location_times_out() {
    let locator = SlowLocator {
        delay: Duration::from_secs(3600),
        answer: Ok(MUMBAI),
    };
    let (session, _) = start(ScriptedGeocoder::default(), locator);
    let mut updates = session.subscribe();

    session.use_my_location();
    let locating = wait_until(&mut updates, |s| s.status == Status::Locating).await;
    assert_eq!(locating.message(), "Finding your location...");

    let idle = wait_until(&mut updates, |s| s.last_error.is_some()).await;
    assert_eq!(idle.status, Status::Idle);
    assert_eq!(
        idle.last_error,
        Some(SearchIssue::Location(LocationError::Timeout))
    );
}

#[tokio::test(start_paused = true)]
async fn test_newer_search_wins() {
    let geocoder = ScriptedGeocoder::default()
        .answer("Bangalore", 5, &[("Bengaluru, Karnataka", KORAMANGALA)])
        .answer("Bandra", 1, &[("Bandra West, Mumbai", MUMBAI)]);
    let (session, _) = start(geocoder, FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.search_text("Bangalore").unwrap();
    session.search_text("Bandra").unwrap();

    let found = wait_until(&mut updates, |s| !s.candidates.is_empty()).await;
    assert_eq!(found.candidates[0].display_name, "Bandra West, Mumbai");

    tokio::time::sleep(Duration::from_secs(30)).await;
    let later = session.snapshot();
    assert_eq!(later.candidates.len(), 1);
    assert_eq!(later.candidates[0].display_name, "Bandra West, Mumbai");
}

#[tokio::test(start_paused = true)]
async fn test_late_location_fix_is_discarded() {
    let locator = SlowLocator {
        delay: Duration::from_secs(5),
        answer: Ok(MUMBAI),
    };
    let geocoder =
        ScriptedGeocoder::default().answer("Koramangala", 1, &[("Koramangala", KORAMANGALA)]);
    let (session, _) = start(geocoder, locator);
    let mut updates = session.subscribe();

    session.use_my_location();
    session.search_text("Koramangala").unwrap();
    wait_until(&mut updates, |s| !s.candidates.is_empty()).await;
    session.select_candidate(0);
    wait_until(&mut updates, |s| s.status == Status::Located).await;

    // the location fix lands after the search already won
    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, Status::Located);
    assert_eq!(snapshot.selection.unwrap().point, KORAMANGALA);
    assert_eq!(ids(&snapshot), vec![6, 7]);
}

#[tokio::test(start_paused = true)]
async fn test_clear_discards_point_and_pending_search() {
    let geocoder = ScriptedGeocoder::default().answer("Baner", 5, &[("Baner, Pune", MUMBAI)]);
    let (session, _) = start(geocoder, FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.click_map(MUMBAI);
    wait_until(&mut updates, |s| s.status == Status::Located).await;

    session.search_text("Baner").unwrap();
    session.clear();
    let idle = wait_until(&mut updates, |s| s.status == Status::Idle).await;
    assert!(idle.selection.is_none());
    assert!(idle.results.is_empty());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(session.snapshot().candidates.is_empty());
    assert_eq!(session.snapshot().status, Status::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_close_does_not_wait_for_lookups() {
    let geocoder =
        ScriptedGeocoder::default().answer("Whitefield", 3600, &[("Whitefield", KORAMANGALA)]);
    let (session, _) = start(geocoder, FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.search_text("Whitefield").unwrap();
    wait_until(&mut updates, |s| s.status == Status::Searching).await;
    session.close();

    // the session task publishes a final idle state and then ends
    let drained = tokio::time::timeout(Duration::from_secs(1), async {
        while updates.changed().await.is_ok() {}
    })
    .await;
    assert!(drained.is_ok());

    let last = session.snapshot();
    assert_eq!(last.status, Status::Idle);
    assert!(last.candidates.is_empty());

    session.click_map(MUMBAI);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.snapshot().status, Status::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_aborts_lookups() {
    let geocoder =
        ScriptedGeocoder::default().answer("Whitefield", 3600, &[("Whitefield", KORAMANGALA)]);
    let (session, geocoder) = start(geocoder, FixedLocator::unavailable());
    let mut updates = session.subscribe();

    session.search_text("Whitefield").unwrap();
    wait_until(&mut updates, |s| s.status == Status::Searching).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    // held by this test, the session's resolver and the lookup task
    assert_eq!(Arc::strong_count(&geocoder), 3);

    drop(session);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(Arc::strong_count(&geocoder), 1);
}
