//! Session lifecycle tests, mostly on a paused clock.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use super::{PollOutcome, PollingSession, Route};
use crate::config::{StageScheme, TrackerConfig};
use crate::core::{Application, SessionState, StageClassification};
use crate::errors::{FetchError, LauncherError};
use crate::events::CollectingEventSink;
use crate::source::ApplicationSource;
use crate::testing::{app_with_state, RecordingNavigator, ScriptedSource};

const VARS: &str = "environment_vars";
const JSON: &str = "environment_json";

struct Harness {
    source: Arc<ScriptedSource>,
    navigator: Arc<RecordingNavigator>,
    sink: Arc<CollectingEventSink>,
    session: PollingSession,
}

fn config() -> Arc<TrackerConfig> {
    Arc::new(TrackerConfig::for_scheme(StageScheme::EnvironmentVars))
}

fn start(config: Arc<TrackerConfig>, source: ScriptedSource) -> Harness {
    let source = Arc::new(source);
    let navigator = Arc::new(RecordingNavigator::new());
    let sink = Arc::new(CollectingEventSink::new());
    let session = PollingSession::builder("a1", config, source.clone())
        .with_navigator(navigator.clone())
        .with_event_sink(sink.clone())
        .start()
        .unwrap();
    Harness {
        source,
        navigator,
        sink,
        session,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn test_first_fetch_is_immediate() {
    let h = start(config(), ScriptedSource::states("a1", VARS, &["bind_services"]));
    assert_eq!(h.session.state(), SessionState::Idle);

    settle().await;

    assert_eq!(h.source.call_count(), 1);
    assert_eq!(h.session.state(), SessionState::Polling);

    let view = h.session.view_model();
    assert_eq!(view.level(), Some(5));
    let classes: Vec<_> = view.stages().into_iter().map(|s| s.classification).collect();
    assert_eq!(
        classes,
        vec![
            StageClassification::Completed,
            StageClassification::Completed,
            StageClassification::Completed,
            StageClassification::Completed,
            StageClassification::Current,
            StageClassification::Pending,
            StageClassification::Pending,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_fetches_follow_the_interval() {
    let h = start(
        config(),
        ScriptedSource::states("a1", VARS, &["creating", "uploading", "provision_db"]),
    );
    settle().await;
    assert_eq!(h.source.call_count(), 1);

    advance(4).await;
    assert_eq!(h.source.call_count(), 1);

    advance(1).await;
    assert_eq!(h.source.call_count(), 2);
    assert_eq!(h.session.view_model().level(), Some(2));

    advance(5).await;
    assert_eq!(h.source.call_count(), 3);
    assert_eq!(h.session.view_model().level(), Some(4));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_navigates_once_and_stops() {
    let mut h = start(config(), ScriptedSource::states("a1", VARS, &["create_user", "finished"]));

    let outcome = h.session.wait().await.unwrap();
    assert_eq!(outcome, PollOutcome::Terminal);
    assert_eq!(h.session.state(), SessionState::Terminal);
    assert!(h.session.has_navigated());
    assert_eq!(h.source.call_count(), 2);

    advance(60).await;
    assert_eq!(h.source.call_count(), 2);
    assert_eq!(
        h.navigator.routes(),
        vec![Route::View {
            app_id: "a1".to_string()
        }]
    );

    let view = h.session.view_model();
    assert!(view
        .stages()
        .iter()
        .all(|s| s.classification == StageClassification::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_on_first_fetch() {
    let mut h = start(config(), ScriptedSource::states("a1", VARS, &["finished"]));

    assert_eq!(h.session.wait().await.unwrap(), PollOutcome::Terminal);
    assert_eq!(h.source.call_count(), 1);
    assert_eq!(h.navigator.routes().len(), 1);
    assert_eq!(
        h.sink.event_types(),
        vec!["poll.started", "poll.fetched", "poll.terminal"]
    );
    assert_eq!(
        h.sink.last_of("poll.terminal").unwrap()["route"],
        serde_json::json!("/app/view/a1")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_between_fetches() {
    let mut h = start(config(), ScriptedSource::states("a1", VARS, &["creating"]));
    settle().await;
    assert_eq!(h.source.call_count(), 1);

    h.session.stop("view closed");
    advance(60).await;

    assert_eq!(h.source.call_count(), 1);
    assert_eq!(h.session.state(), SessionState::Cancelled);
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.sink.count_of("poll.cancelled"), 1);
    assert_eq!(
        h.sink.last_of("poll.cancelled").unwrap()["reason"],
        serde_json::json!("view closed")
    );
    assert_eq!(h.session.wait().await.unwrap(), PollOutcome::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_fetch_discards_result() {
    let mut h = start(
        config(),
        ScriptedSource::states("a1", VARS, &["finished"]).with_latency(Duration::from_secs(2)),
    );
    advance(1).await;
    assert_eq!(h.source.call_count(), 1);
    assert_eq!(h.source.completed_count(), 0);

    h.session.stop("view closed");
    advance(30).await;

    assert_eq!(h.source.completed_count(), 0);
    assert_eq!(h.session.view_model().level(), None);
    assert!(!h.session.has_navigated());
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let mut h = start(config(), ScriptedSource::states("a1", VARS, &["creating"]));
    settle().await;

    h.session.stop("first");
    h.session.stop("second");

    assert_eq!(h.sink.count_of("poll.cancelled"), 1);
    assert_eq!(h.session.state(), SessionState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_polling() {
    let h = start(config(), ScriptedSource::states("a1", VARS, &["creating"]));
    settle().await;
    let source = h.source.clone();
    let sink = h.sink.clone();

    drop(h);
    advance(60).await;

    assert_eq!(source.call_count(), 1);
    assert_eq!(sink.count_of("poll.cancelled"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_keeps_previous_progress() {
    let source = ScriptedSource::new(vec![
        Ok(app_with_state("a1", VARS, "bind_services")),
        Err(FetchError::transport("http://api/applications/a1", "connection reset")),
        Ok(app_with_state("a1", VARS, "restarting_atk")),
    ]);
    let h = start(config(), source);
    settle().await;
    assert_eq!(h.session.view_model().level(), Some(5));

    advance(5).await;
    assert_eq!(h.source.call_count(), 2);
    assert_eq!(h.session.view_model().level(), Some(5));
    assert_eq!(h.session.view_model().snapshot().sequence(), 1);
    assert_eq!(h.session.state(), SessionState::Polling);

    let failed = h.sink.last_of("poll.failed").unwrap();
    assert_eq!(failed["kind"], serde_json::json!("transport"));
    assert_eq!(failed["transient"], serde_json::json!(true));

    advance(5).await;
    assert_eq!(h.source.call_count(), 3);
    assert_eq!(h.session.view_model().level(), Some(6));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_fetch_is_still_retried() {
    let source = ScriptedSource::new(vec![
        Err(FetchError::status("http://api/applications/a1", 403, "forbidden")),
        Ok(app_with_state("a1", VARS, "creating")),
    ]);
    let h = start(config(), source);
    settle().await;
    assert_eq!(h.session.view_model().level(), None);

    advance(5).await;
    assert_eq!(h.source.call_count(), 2);
    assert_eq!(h.session.view_model().level(), Some(1));
    assert_eq!(
        h.sink.last_of("poll.failed").unwrap()["transient"],
        serde_json::json!(false)
    );
}

#[tokio::test(start_paused = true)]
async fn test_unknown_state_shows_everything_pending() {
    let h = start(config(), ScriptedSource::states("a1", VARS, &["warming_up"]));
    settle().await;

    let view = h.session.view_model();
    assert_eq!(view.level(), None);
    assert_eq!(view.snapshot().state(), Some("warming_up"));
    assert!(view
        .stages()
        .iter()
        .all(|s| s.classification == StageClassification::Pending));
    assert_eq!(h.sink.count_of("poll.unknown_stage"), 1);
    assert_eq!(h.session.state(), SessionState::Polling);
}

#[tokio::test(start_paused = true)]
async fn test_record_without_state() {
    let source = ScriptedSource::new(vec![Ok(crate::core::Application::new("a1"))]);
    let h = start(config(), source);
    settle().await;

    let view = h.session.view_model();
    assert!(view.application().is_some());
    assert_eq!(view.level(), None);
    assert_eq!(h.sink.count_of("poll.unknown_stage"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_json_scheme_never_terminates() {
    let config = Arc::new(TrackerConfig::for_scheme(StageScheme::EnvironmentJson));
    let h = start(config, ScriptedSource::states("a1", JSON, &["create_user", "finished"]));
    settle().await;
    assert_eq!(h.session.view_model().level(), Some(7));

    advance(30).await;
    assert!(h.source.call_count() > 2);
    assert!(!h.session.has_navigated());
    assert_eq!(h.session.state(), SessionState::Polling);
}

#[tokio::test(start_paused = true)]
async fn test_view_model_sees_every_snapshot() {
    let h = start(
        config(),
        ScriptedSource::states("a1", VARS, &["creating", "uploading", "finished"]),
    );
    let mut view = h.session.view_model();

    let mut levels = Vec::new();
    while view.changed().await {
        levels.push(view.level());
    }

    assert_eq!(levels, vec![Some(1), Some(2), Some(8)]);
    assert_eq!(h.session.state(), SessionState::Terminal);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = Arc::new(TrackerConfig::default().with_base_url(""));
    let source = Arc::new(ScriptedSource::default());

    let err = PollingSession::start("a1", config, source).unwrap_err();
    assert!(matches!(err, LauncherError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn test_independent_sessions() {
    let first = start(config(), ScriptedSource::states("a1", VARS, &["creating"]));
    let second = start(config(), ScriptedSource::states("a1", VARS, &["provision_db"]));
    settle().await;

    assert_ne!(first.session.id(), second.session.id());
    assert_eq!(first.session.view_model().level(), Some(1));
    assert_eq!(second.session.view_model().level(), Some(4));

    drop(first);
    advance(5).await;
    assert_eq!(second.source.call_count(), 2);
}

/// Reports `finished` after signalling that a fetch is under way and holding
/// its worker thread for a while.
struct SlowFinishingSource {
    entered: Arc<Notify>,
    hold: Duration,
}

#[async_trait]
impl ApplicationSource for SlowFinishingSource {
    async fn fetch_application(&self, app_id: &str) -> Result<Application, FetchError> {
        self.entered.notify_one();
        std::thread::sleep(self.hold);
        Ok(app_with_state(app_id, VARS, "finished"))
    }

    async fn list_applications(&self) -> Result<Vec<Application>, FetchError> {
        Ok(Vec::new())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_while_fetch_completes_discards_result() {
    let entered = Arc::new(Notify::new());
    let source = Arc::new(SlowFinishingSource {
        entered: entered.clone(),
        hold: Duration::from_millis(200),
    });
    let navigator = Arc::new(RecordingNavigator::new());
    let sink = Arc::new(CollectingEventSink::new());
    let mut session = PollingSession::builder("a1", config(), source)
        .with_navigator(navigator.clone())
        .with_event_sink(sink.clone())
        .start()
        .unwrap();

    entered.notified().await;
    session.stop("view closed");
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(session.view_model().level(), None);
    assert!(!session.has_navigated());
    assert!(navigator.routes().is_empty());
    assert_eq!(sink.count_of("poll.fetched"), 0);
    assert_eq!(sink.count_of("poll.terminal"), 0);
    assert_eq!(sink.count_of("poll.cancelled"), 1);
    assert_eq!(session.wait().await.unwrap(), PollOutcome::Cancelled);
}
