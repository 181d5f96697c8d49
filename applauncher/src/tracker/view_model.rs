//! Read-only progress snapshots for the presentation layer.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::core::{Application, StageClassification, StageTable};

/// The tracker's view of one fetch.
///
/// A new snapshot replaces the old one on every successful fetch; snapshots
/// themselves never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    application: Option<Application>,
    state: Option<String>,
    level: Option<u32>,
    fetched_at: Option<String>,
    sequence: u64,
}

impl ProgressSnapshot {
    /// The fetched record, absent before the first successful fetch.
    #[must_use]
    pub fn application(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    /// The raw state value of the record.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// The current level, absent when the state is unknown.
    #[must_use]
    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// When the record was fetched.
    #[must_use]
    pub fn fetched_at(&self) -> Option<&str> {
        self.fetched_at.as_deref()
    }

    /// Number of successful fetches this snapshot reflects.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Classifies a stage ordinal against the current level.
    #[must_use]
    pub fn classify(&self, ordinal: u32) -> StageClassification {
        StageClassification::classify(ordinal, self.level)
    }
}

/// One row of the progress listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageProgress {
    /// Stage name.
    pub name: String,
    /// Stage ordinal.
    pub ordinal: u32,
    /// Classification against the current level.
    pub classification: StageClassification,
}

/// Read handle on a session's progress.
///
/// Cloning is cheap; all clones observe the same session.
#[derive(Debug, Clone)]
pub struct ProgressViewModel {
    stages: Arc<StageTable>,
    rx: watch::Receiver<Arc<ProgressSnapshot>>,
}

impl ProgressViewModel {
    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ProgressSnapshot> {
        self.rx.borrow().clone()
    }

    /// The latest fetched record.
    #[must_use]
    pub fn application(&self) -> Option<Application> {
        self.rx.borrow().application.clone()
    }

    /// The current level.
    #[must_use]
    pub fn level(&self) -> Option<u32> {
        self.rx.borrow().level
    }

    /// Classifies a stage ordinal against the current level.
    #[must_use]
    pub fn classify(&self, ordinal: u32) -> StageClassification {
        self.rx.borrow().classify(ordinal)
    }

    /// The configured stage table.
    #[must_use]
    pub fn stage_table(&self) -> &StageTable {
        &self.stages
    }

    /// Every configured stage with its classification, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<StageProgress> {
        let snapshot = self.snapshot();
        self.stages
            .iter()
            .map(|stage| StageProgress {
                name: stage.name.clone(),
                ordinal: stage.ordinal,
                classification: snapshot.classify(stage.ordinal),
            })
            .collect()
    }

    /// Waits for the next snapshot.
    ///
    /// Returns false once the session has stopped publishing.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Write side of the view model, owned by the poller.
#[derive(Debug)]
pub(crate) struct ProgressPublisher {
    tx: watch::Sender<Arc<ProgressSnapshot>>,
    sequence: u64,
}

impl ProgressPublisher {
    /// Publishes the result of a successful fetch.
    pub(crate) fn publish(
        &mut self,
        application: Application,
        state: Option<String>,
        level: Option<u32>,
    ) -> Arc<ProgressSnapshot> {
        self.sequence += 1;
        let snapshot = Arc::new(ProgressSnapshot {
            application: Some(application),
            state,
            level,
            fetched_at: Some(crate::utils::iso_timestamp()),
            sequence: self.sequence,
        });
        self.tx.send_replace(snapshot.clone());
        snapshot
    }
}

/// Creates a connected publisher and view model with an empty snapshot.
pub(crate) fn progress_channel(stages: Arc<StageTable>) -> (ProgressPublisher, ProgressViewModel) {
    let (tx, rx) = watch::channel(Arc::new(ProgressSnapshot::default()));
    (
        ProgressPublisher { tx, sequence: 0 },
        ProgressViewModel { stages, rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_stage_table;
    use crate::core::LAUNCHER_STATE_FIELD;
    use pretty_assertions::assert_eq;

    fn app(state: &str) -> Application {
        Application::new("a1").with_metadata("environment_vars", LAUNCHER_STATE_FIELD, state)
    }

    #[test]
    fn test_initial_snapshot_is_empty() {
        let (_publisher, view) = progress_channel(Arc::new(default_stage_table()));

        let snapshot = view.snapshot();
        assert!(snapshot.application().is_none());
        assert_eq!(snapshot.level(), None);
        assert_eq!(snapshot.sequence(), 0);
        assert!(view
            .stages()
            .iter()
            .all(|s| s.classification == StageClassification::Pending));
    }

    #[test]
    fn test_publish_updates_view() {
        let (mut publisher, view) = progress_channel(Arc::new(default_stage_table()));
        publisher.publish(app("bind_services"), Some("bind_services".to_string()), Some(5));

        assert_eq!(view.level(), Some(5));
        assert_eq!(view.classify(5), StageClassification::Current);
        assert_eq!(view.classify(2), StageClassification::Completed);
        assert_eq!(view.classify(6), StageClassification::Pending);
        assert_eq!(view.snapshot().state(), Some("bind_services"));
        assert_eq!(view.snapshot().sequence(), 1);
        assert!(view.snapshot().fetched_at().is_some());

        let rows = view.stages();
        assert_eq!(rows.len(), 7);
        assert_eq!(
            rows[4],
            StageProgress {
                name: "bind_services".to_string(),
                ordinal: 5,
                classification: StageClassification::Current,
            }
        );
        assert_eq!(rows[1].classification, StageClassification::Completed);
        assert_eq!(rows[5].classification, StageClassification::Pending);
    }

    #[test]
    fn test_repeated_queries_are_stable() {
        let (mut publisher, view) = progress_channel(Arc::new(default_stage_table()));
        publisher.publish(app("provision_db"), Some("provision_db".to_string()), Some(4));

        let first = view.stages();
        for _ in 0..3 {
            assert_eq!(view.stages(), first);
        }
        assert_eq!(view.snapshot().sequence(), 1);
    }

    #[test]
    fn test_old_snapshot_is_unchanged_by_publish() {
        let (mut publisher, view) = progress_channel(Arc::new(default_stage_table()));
        publisher.publish(app("creating"), Some("creating".to_string()), Some(1));
        let before = view.snapshot();

        publisher.publish(app("uploading"), Some("uploading".to_string()), Some(2));

        assert_eq!(before.level(), Some(1));
        assert_eq!(view.level(), Some(2));
    }

    #[tokio::test]
    async fn test_changed_reports_updates_and_close() {
        let (mut publisher, mut view) = progress_channel(Arc::new(default_stage_table()));
        publisher.publish(app("creating"), Some("creating".to_string()), Some(1));
        assert!(view.changed().await);

        drop(publisher);
        assert!(!view.changed().await);
    }
}
