//! Integration tests for the agenda crate
//!
//! These tests run complete update cycles against a mock HTTP server, from
//! trigger through download, parsing and change detection to notification.

use agenda::alarm::UpdateAlarm;
use agenda::notify::{NotificationPresenter, NotificationTexts, ScheduleUpdateNotification};
use agenda::storage::{InMemoryScheduleStore, ScheduleStore, SqliteScheduleStore};
use agenda::sync::{
    ConnectivityGate, CycleOutcome, FetchCoordinator, ManualConnectivity, Reachability,
    SyncPipeline, TaskState, Trigger, UpdateService, WorkHost,
};
use agenda::{AppRepository, ChangeNotifier, HttpOutcome, ScheduleRepository, Settings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCHEDULE_V1: &str = r#"{
    "version": "1.0",
    "title": "Congress",
    "days": 2,
    "sessions": [
        {"id": "opening", "title": "Opening", "day": 1, "room": "Hall 1",
         "start": "2025-12-27T10:00:00Z", "duration": 30, "speakers": ["Alice"]},
        {"id": "keynote", "title": "Keynote", "day": 1, "room": "Hall 1",
         "start": "2025-12-27T11:00:00Z", "duration": 60, "speakers": ["Bob"]},
        {"id": "closing", "title": "Closing", "day": 2, "room": "Hall 1",
         "start": "2025-12-28T18:00:00Z", "duration": 30}
    ]
}"#;

// Keynote moved to Hall 2, closing dropped, a workshop added.
const SCHEDULE_V2: &str = r#"{
    "version": "1.1",
    "title": "Congress",
    "days": 2,
    "sessions": [
        {"id": "opening", "title": "Opening", "day": 1, "room": "Hall 1",
         "start": "2025-12-27T10:00:00Z", "duration": 30, "speakers": ["Alice"]},
        {"id": "keynote", "title": "Keynote", "day": 1, "room": "Hall 2",
         "start": "2025-12-27T11:00:00Z", "duration": 60, "speakers": ["Bob"]},
        {"id": "workshop", "title": "Workshop", "day": 2, "room": "Room A",
         "start": "2025-12-28T14:00:00Z", "duration": 120}
    ]
}"#;

const SHIFTS: &str = r#"{
    "shifts": [
        {"id": "s1", "title": "Angel", "room": "Info desk",
         "start": "2025-12-27T09:00:00Z", "duration": 120}
    ]
}"#;

#[derive(Default)]
struct Recorder {
    notifications: Mutex<Vec<ScheduleUpdateNotification>>,
    alarms: AtomicUsize,
    finished: Mutex<Vec<CycleOutcome>>,
}

impl NotificationPresenter for Recorder {
    fn present(&self, notification: ScheduleUpdateNotification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

impl UpdateAlarm for Recorder {
    fn set_update_alarm(&self, _immediate: bool) {
        self.alarms.fetch_add(1, Ordering::SeqCst);
    }

    fn discard_update_alarm(&self) {}
}

impl WorkHost for Recorder {
    fn work_finished(&self, outcome: &CycleOutcome) {
        self.finished.lock().unwrap().push(outcome.clone());
    }
}

struct Harness {
    service: Arc<UpdateService>,
    recorder: Arc<Recorder>,
    store: Arc<dyn ScheduleStore>,
    connectivity: Arc<ManualConnectivity>,
}

impl Harness {
    fn new(settings: Settings, store: Arc<dyn ScheduleStore>) -> Self {
        let recorder = Arc::new(Recorder::default());
        let connectivity = Arc::new(ManualConnectivity::new(Reachability::Available));
        let repository: Arc<dyn ScheduleRepository> =
            Arc::new(AppRepository::new(settings, Arc::clone(&store)));
        let pipeline = SyncPipeline::new(
            Arc::new(FetchCoordinator::new()),
            ConnectivityGate::new(connectivity.clone()),
            repository,
            recorder.clone(),
            ChangeNotifier::new(recorder.clone(), NotificationTexts::default()),
        );
        Self {
            service: Arc::new(UpdateService::new(pipeline)),
            recorder,
            store,
            connectivity,
        }
    }

    async fn trigger(&self, trigger: Trigger) -> CycleOutcome {
        self.service.handle_work(trigger, self.recorder.as_ref()).await
    }

    fn notifications(&self) -> Vec<ScheduleUpdateNotification> {
        self.recorder.notifications.lock().unwrap().clone()
    }
}

fn settings(server: &MockServer) -> Settings {
    Settings::new(format!("{}/schedule.json", server.uri()))
}

async fn serve(server: &MockServer, document: &str, etag: &str) {
    server.reset().await;
    // Conditional request matching the current ETag
    Mock::given(method("GET"))
        .and(path("/schedule.json"))
        .and(header("If-None-Match", etag))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/schedule.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", etag)
                .set_body_string(document),
        )
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_first_sync_stores_schedule_without_notifying() {
    let server = MockServer::start().await;
    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));

    let outcome = harness.trigger(Trigger::AppStart).await;

    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            version: "1.0".to_string(),
            success: true,
            changed: 0,
            notified: false
        }
    );
    let meta = harness.store.read_meta().unwrap();
    assert_eq!(meta.version, "1.0");
    assert_eq!(meta.num_days, 2);
    assert_eq!(meta.etag, "\"v1\"");
    assert_eq!(harness.store.list_sessions().unwrap().len(), 3);
    assert!(harness.notifications().is_empty());
    assert_eq!(harness.recorder.alarms.load(Ordering::SeqCst), 1);
    assert_eq!(harness.service.task_state(), TaskState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_changed_schedule_notifies_once() {
    let server = MockServer::start().await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));

    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    harness.trigger(Trigger::AppStart).await;

    serve(&server, SCHEDULE_V2, "\"v2\"").await;
    let outcome = harness.trigger(Trigger::Alarm).await;

    // keynote moved, workshop new, closing canceled
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            version: "1.1".to_string(),
            success: true,
            changed: 3,
            notified: true
        }
    );

    let notifications = harness.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Schedule updated to 1.1");
    assert_eq!(notifications[0].count, 3);

    let changed = harness.store.list_changed_sessions().unwrap();
    let keynote = changed.iter().find(|s| s.id.as_str() == "keynote").unwrap();
    assert!(keynote.changed_room);
    assert!(changed.iter().any(|s| s.id.as_str() == "workshop" && s.is_new));
    assert!(changed.iter().any(|s| s.id.as_str() == "closing" && s.is_canceled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_not_modified_skips_parse() {
    let server = MockServer::start().await;
    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));

    harness.trigger(Trigger::AppStart).await;
    let outcome = harness.trigger(Trigger::Manual).await;

    assert_eq!(outcome, CycleOutcome::NotModified);
    assert_eq!(harness.store.read_meta().unwrap().version, "1.0");
    assert!(harness.notifications().is_empty());
    assert_eq!(harness.recorder.alarms.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_failure_ends_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));

    let outcome = harness.trigger(Trigger::Alarm).await;

    assert_eq!(outcome, CycleOutcome::FetchFailed(HttpOutcome::NotFound));
    assert!(!harness.store.read_meta().unwrap().has_schedule());
    assert_eq!(harness.recorder.alarms.load(Ordering::SeqCst), 1);
    assert_eq!(harness.service.task_state(), TaskState::Idle);
    assert_eq!(harness.recorder.finished.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_document_keeps_schedule_and_does_not_notify() {
    let server = MockServer::start().await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));

    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    harness.trigger(Trigger::AppStart).await;

    serve(&server, "<html>maintenance</html>", "\"broken\"").await;
    let outcome = harness.trigger(Trigger::Alarm).await;

    assert!(matches!(outcome, CycleOutcome::Completed { success: false, notified: false, .. }));
    let meta = harness.store.read_meta().unwrap();
    assert_eq!(meta.version, "1.0");
    assert_eq!(meta.etag, "\"v1\"");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_offline_does_not_touch_network() {
    let server = MockServer::start().await;
    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));
    harness.connectivity.set_available(false);

    let outcome = harness.trigger(Trigger::Alarm).await;

    assert_eq!(outcome, CycleOutcome::NoConnectivity);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    assert_eq!(harness.recorder.alarms.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shifts_are_loaded_alongside() {
    let server = MockServer::start().await;
    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    Mock::given(method("GET"))
        .and(path("/shifts.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHIFTS))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.shifts_url = Some(format!("{}/shifts.json", server.uri()));
    let harness = Harness::new(settings, Arc::new(InMemoryScheduleStore::new()));

    let outcome = harness.trigger(Trigger::AppStart).await;

    assert!(matches!(outcome, CycleOutcome::Completed { success: true, .. }));
    let shifts = harness.store.list_shifts().unwrap();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].room, "Info desk");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_changes_survive_restart_with_sqlite() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("agenda.sqlite");

    {
        let store = Arc::new(SqliteScheduleStore::new(&db_path).unwrap());
        let harness = Harness::new(settings(&server), store);
        serve(&server, SCHEDULE_V1, "\"v1\"").await;
        harness.trigger(Trigger::AppStart).await;
    }

    let store = Arc::new(SqliteScheduleStore::new(&db_path).unwrap());
    let harness = Harness::new(settings(&server), store);

    // Stored ETag is sent, so an unchanged schedule is not downloaded again
    assert_eq!(harness.trigger(Trigger::AppStart).await, CycleOutcome::NotModified);

    serve(&server, SCHEDULE_V2, "\"v2\"").await;
    let outcome = harness.trigger(Trigger::Alarm).await;
    assert!(matches!(outcome, CycleOutcome::Completed { changed: 3, notified: true, .. }));
    assert_eq!(harness.store.list_changed_sessions().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_work_finished_for_every_trigger() {
    let server = MockServer::start().await;
    serve(&server, SCHEDULE_V1, "\"v1\"").await;
    let harness = Harness::new(settings(&server), Arc::new(InMemoryScheduleStore::new()));

    harness.trigger(Trigger::AppStart).await;
    harness.connectivity.set_available(false);
    harness.trigger(Trigger::Manual).await;

    let finished = harness.recorder.finished.lock().unwrap();
    assert_eq!(finished.len(), 2);
    assert_eq!(finished[1], CycleOutcome::NoConnectivity);
}
