//! Polling sessions: one per progress view.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::navigation::{NavigationTrigger, Navigator, Route};
use super::poller::{PollOutcome, StatusPoller};
use super::view_model::{progress_channel, ProgressViewModel};
use crate::cancellation::CancellationToken;
use crate::config::TrackerConfig;
use crate::core::SessionState;
use crate::errors::LauncherError;
use crate::events::{EventSink, NoOpEventSink, PollEvent};
use crate::source::ApplicationSource;

/// Navigator used when none is configured: logs and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
struct DetachedNavigator;

impl Navigator for DetachedNavigator {
    fn navigate(&self, route: Route) {
        debug!(route = %route, "No navigator attached");
    }
}

/// Collects the collaborators of a session before starting it.
pub struct SessionBuilder {
    app_id: String,
    config: Arc<TrackerConfig>,
    source: Arc<dyn ApplicationSource>,
    navigator: Arc<dyn Navigator>,
    sink: Arc<dyn EventSink>,
}

impl SessionBuilder {
    /// Creates a builder for tracking `app_id`.
    #[must_use]
    pub fn new(
        app_id: impl Into<String>,
        config: Arc<TrackerConfig>,
        source: Arc<dyn ApplicationSource>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            config,
            source,
            navigator: Arc::new(DetachedNavigator),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the navigator invoked on the terminal state.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validates the configuration and starts polling on the current tokio
    /// runtime.
    pub fn start(self) -> Result<PollingSession, LauncherError> {
        self.config.validate()?;

        let id = Uuid::new_v4();
        let state = Arc::new(RwLock::new(SessionState::Idle));
        let token = Arc::new(CancellationToken::new());
        let trigger = Arc::new(NavigationTrigger::new(self.navigator));
        let (publisher, view_model) = progress_channel(Arc::new(self.config.stages.clone()));

        let poller = StatusPoller {
            session_id: id.to_string(),
            app_id: self.app_id.clone(),
            config: self.config,
            source: self.source,
            sink: self.sink.clone(),
            trigger: trigger.clone(),
            token: token.clone(),
            state: state.clone(),
            publisher,
        };
        let handle = tokio::spawn(poller.run());

        Ok(PollingSession {
            id,
            app_id: self.app_id,
            state,
            token,
            trigger,
            view_model,
            sink: self.sink,
            handle: Some(handle),
        })
    }
}

/// A running progress-tracking session bound to one application.
///
/// Stopping or dropping the session cancels the pending fetch or wait at
/// once; no fetch runs and no snapshot is published afterwards.
pub struct PollingSession {
    id: Uuid,
    app_id: String,
    state: Arc<RwLock<SessionState>>,
    token: Arc<CancellationToken>,
    trigger: Arc<NavigationTrigger>,
    view_model: ProgressViewModel,
    sink: Arc<dyn EventSink>,
    handle: Option<JoinHandle<PollOutcome>>,
}

impl PollingSession {
    /// Starts a session with default navigator and sink.
    pub fn start(
        app_id: impl Into<String>,
        config: Arc<TrackerConfig>,
        source: Arc<dyn ApplicationSource>,
    ) -> Result<Self, LauncherError> {
        SessionBuilder::new(app_id, config, source).start()
    }

    /// Returns a builder for a session.
    #[must_use]
    pub fn builder(
        app_id: impl Into<String>,
        config: Arc<TrackerConfig>,
        source: Arc<dyn ApplicationSource>,
    ) -> SessionBuilder {
        SessionBuilder::new(app_id, config, source)
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tracked application.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The progress route this session backs.
    #[must_use]
    pub fn route(&self) -> Route {
        Route::Provision {
            app_id: self.app_id.clone(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Read handle on the progress view model.
    #[must_use]
    pub fn view_model(&self) -> ProgressViewModel {
        self.view_model.clone()
    }

    /// Whether navigation to the view route has fired.
    #[must_use]
    pub fn has_navigated(&self) -> bool {
        self.trigger.has_fired()
    }

    /// Tears the session down. Idempotent.
    pub fn stop(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.token.cancel(reason.clone());
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if transition(&self.state, SessionState::Cancelled) {
            debug!(app_id = %self.app_id, reason = %reason, "Session stopped");
            let event = PollEvent::Cancelled {
                app_id: self.app_id.clone(),
                reason,
            };
            self.sink.try_emit(event.event_type(), Some(event.payload()));
        }
    }

    /// Waits for the poll loop to end.
    ///
    /// Returns immediately with the current outcome if the loop already
    /// ended or the session was stopped.
    pub async fn wait(&mut self) -> Result<PollOutcome, LauncherError> {
        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(outcome) => Ok(outcome),
                Err(err) if err.is_cancelled() => Ok(PollOutcome::Cancelled),
                Err(err) => Err(LauncherError::Internal(format!("poll task failed: {err}"))),
            },
            None if self.state() == SessionState::Terminal => Ok(PollOutcome::Terminal),
            None => Ok(PollOutcome::Cancelled),
        }
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.stop("session dropped");
    }
}

/// Moves `state` to `next` unless it is already final.
///
/// Returns true if the transition happened.
pub(crate) fn transition(state: &RwLock<SessionState>, next: SessionState) -> bool {
    let mut current = state.write();
    if current.is_final() {
        false
    } else {
        *current = next;
        true
    }
}

impl std::fmt::Debug for PollingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingSession")
            .field("id", &self.id)
            .field("app_id", &self.app_id)
            .field("state", &self.state())
            .field("navigated", &self.has_navigated())
            .finish()
    }
}
