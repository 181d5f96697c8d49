//! Mock collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::{Application, LAUNCHER_STATE_FIELD};
use crate::errors::FetchError;
use crate::source::ApplicationSource;
use crate::tracker::{Navigator, Route};

/// Builds a record whose launcher state is `state` under `metadata_key`.
#[must_use]
pub fn app_with_state(app_id: &str, metadata_key: &str, state: &str) -> Application {
    Application::new(app_id)
        .with_name(format!("{app_id}-name"))
        .with_metadata(metadata_key, LAUNCHER_STATE_FIELD, state)
}

/// An application source that replays a script of fetch results.
///
/// Each fetch consumes the next entry. Once one entry remains it is returned
/// for every further fetch.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Application, FetchError>>>,
    listing: Mutex<Vec<Application>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedSource {
    /// Creates a source with the given script.
    #[must_use]
    pub fn new(script: Vec<Result<Application, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Creates a source that reports the given states in order.
    #[must_use]
    pub fn states(app_id: &str, metadata_key: &str, states: &[&str]) -> Self {
        Self::new(
            states
                .iter()
                .map(|state| Ok(app_with_state(app_id, metadata_key, state)))
                .collect(),
        )
    }

    /// Delays every fetch by `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Sets the records returned by `list_applications`.
    #[must_use]
    pub fn with_listing(self, listing: Vec<Application>) -> Self {
        *self.listing.lock() = listing;
        self
    }

    /// Appends an entry to the script.
    pub fn push(&self, entry: Result<Application, FetchError>) {
        self.script.lock().push_back(entry);
    }

    /// Number of fetches started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fetches that ran to completion.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn next_entry(&self, app_id: &str) -> Result<Application, FetchError> {
        let mut script = self.script.lock();
        let entry = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        entry.unwrap_or_else(|| {
            Err(FetchError::status(
                format!("scripted://applications/{app_id}"),
                404,
                "script exhausted",
            ))
        })
    }
}

#[async_trait]
impl ApplicationSource for ScriptedSource {
    async fn fetch_application(&self, app_id: &str) -> Result<Application, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let entry = self.next_entry(app_id);
        self.completed.fetch_add(1, Ordering::SeqCst);
        entry
    }

    async fn list_applications(&self) -> Result<Vec<Application>, FetchError> {
        Ok(self.listing.lock().clone())
    }
}

/// A navigator that records every route it receives.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    /// Creates a navigator with no recorded routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes received so far, in order.
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().push(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_source_repeats_last_entry() {
        let source = ScriptedSource::states("a1", "environment_vars", &["creating", "uploading"]);

        let first = source.fetch_application("a1").await.unwrap();
        let second = source.fetch_application("a1").await.unwrap();
        let third = source.fetch_application("a1").await.unwrap();

        assert_eq!(first.state("environment_vars", LAUNCHER_STATE_FIELD), Some("creating"));
        assert_eq!(second.state("environment_vars", LAUNCHER_STATE_FIELD), Some("uploading"));
        assert_eq!(third.state("environment_vars", LAUNCHER_STATE_FIELD), Some("uploading"));
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_reports_not_found() {
        let source = ScriptedSource::new(Vec::new());
        let err = source.fetch_application("a1").await.unwrap_err();
        assert_eq!(err.kind(), "status");
    }

    #[tokio::test]
    async fn test_listing() {
        let source = ScriptedSource::default().with_listing(vec![Application::new("x")]);
        let apps = source.list_applications().await.unwrap();
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(Route::View {
            app_id: "a1".to_string(),
        });
        assert_eq!(navigator.routes().len(), 1);
    }
}
