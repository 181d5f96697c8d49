//! The status poll loop.
//!
//! One loop per session: fetch, publish, wait the interval, repeat. The next
//! fetch is only scheduled after the previous one completed, so fetches never
//! overlap. Every await races the session's cancellation token.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use super::navigation::NavigationTrigger;
use super::session::transition;
use super::view_model::ProgressPublisher;
use crate::cancellation::CancellationToken;
use crate::config::TrackerConfig;
use crate::core::{Application, SessionState};
use crate::errors::FetchError;
use crate::events::{emit_poll_event, EventSink, PollEvent};
use crate::source::ApplicationSource;
use crate::utils::elapsed_ms;

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The terminal marker was observed.
    Terminal,
    /// The session was torn down first.
    Cancelled,
}

/// Result of a single successful fetch.
enum Cycle {
    Continue,
    Terminal,
    Stopped,
}

/// Drives one session's fetch loop.
pub(crate) struct StatusPoller {
    pub(crate) session_id: String,
    pub(crate) app_id: String,
    pub(crate) config: Arc<TrackerConfig>,
    pub(crate) source: Arc<dyn ApplicationSource>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) trigger: Arc<NavigationTrigger>,
    pub(crate) token: Arc<CancellationToken>,
    pub(crate) state: Arc<RwLock<SessionState>>,
    pub(crate) publisher: ProgressPublisher,
}

impl StatusPoller {
    /// Runs until the terminal marker is seen or the token is cancelled.
    pub(crate) async fn run(self) -> PollOutcome {
        let span = tracing::info_span!(
            "poll_session",
            session_id = %self.session_id,
            app_id = %self.app_id
        );
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> PollOutcome {
        if self.token.is_cancelled() {
            return self.finish_cancelled().await;
        }
        self.set_state(SessionState::Polling);
        self.emit(PollEvent::Started {
            session_id: self.session_id.clone(),
            app_id: self.app_id.clone(),
        })
        .await;

        let interval = self.config.poll_interval();
        loop {
            let started = Instant::now();
            let fetched = tokio::select! {
                biased;
                () = self.token.cancelled() => return self.finish_cancelled().await,
                result = self.source.fetch_application(&self.app_id) => result,
            };
            if self.token.is_cancelled() {
                return self.finish_cancelled().await;
            }

            match fetched {
                Ok(app) => match self.apply(app, elapsed_ms(started)).await {
                    Cycle::Continue => {}
                    Cycle::Terminal => return PollOutcome::Terminal,
                    Cycle::Stopped => return self.finish_cancelled().await,
                },
                Err(err) => self.record_failure(&err).await,
            }

            debug!(interval = ?interval, "Next fetch scheduled");
            tokio::select! {
                biased;
                () = self.token.cancelled() => return self.finish_cancelled().await,
                () = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn apply(&mut self, app: Application, duration_ms: f64) -> Cycle {
        let state = app
            .state(&self.config.metadata_key, &self.config.state_field)
            .map(str::to_string);
        let level = state.as_deref().and_then(|s| self.config.resolve_level(s));
        let terminal = state.as_deref().is_some_and(|s| self.config.is_terminal(s));

        // Publishing and the terminal hand-off happen under the state lock, so
        // a concurrent stop either sees them done or prevents them.
        let route = {
            let mut current = self.state.write();
            if current.is_final() {
                return Cycle::Stopped;
            }
            self.publisher.publish(app, state.clone(), level);
            if terminal {
                *current = SessionState::Terminal;
                self.trigger.fire(&self.app_id)
            } else {
                None
            }
        };

        match (&state, level) {
            (Some(s), None) => {
                warn!(state = %s, "State is not a configured stage");
                self.emit(PollEvent::UnknownStage {
                    app_id: self.app_id.clone(),
                    state: s.clone(),
                })
                .await;
            }
            (None, _) => {
                debug!(
                    metadata_key = %self.config.metadata_key,
                    field = %self.config.state_field,
                    "Record carries no state"
                );
            }
            (Some(_), Some(_)) => {}
        }

        debug!(state = ?state, level = ?level, "Fetched application");
        self.emit(PollEvent::Fetched {
            app_id: self.app_id.clone(),
            state,
            level,
            duration_ms,
        })
        .await;

        if !terminal {
            return Cycle::Continue;
        }

        if let Some(route) = route {
            self.emit(PollEvent::Terminal {
                app_id: self.app_id.clone(),
                route: route.path(),
            })
            .await;
        }
        Cycle::Terminal
    }

    async fn record_failure(&self, err: &FetchError) {
        if err.is_transient() {
            warn!(error = %err, "Fetch failed, retrying next cycle");
        } else {
            warn!(error = %err, status_kind = err.kind(), "Fetch rejected, retrying next cycle");
        }
        self.emit(PollEvent::failed(&self.app_id, err)).await;
    }

    async fn finish_cancelled(&self) -> PollOutcome {
        if transition(&self.state, SessionState::Cancelled) {
            let reason = self
                .token
                .reason()
                .unwrap_or_else(|| "cancelled".to_string());
            info!(reason = %reason, "Polling stopped");
            self.emit(PollEvent::Cancelled {
                app_id: self.app_id.clone(),
                reason,
            })
            .await;
        }
        PollOutcome::Cancelled
    }

    fn set_state(&self, next: SessionState) {
        transition(&self.state, next);
    }

    async fn emit(&self, event: PollEvent) {
        emit_poll_event(self.sink.as_ref(), &event).await;
    }
}
