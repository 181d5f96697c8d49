//! Events emitted by the status poller.

use serde::Serialize;

use crate::errors::FetchError;

/// Something the poller observed during a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    /// The poll loop began.
    Started {
        /// Session identifier.
        session_id: String,
        /// Tracked application.
        app_id: String,
    },
    /// A record was fetched and published.
    Fetched {
        /// Tracked application.
        app_id: String,
        /// Raw state value, if present.
        state: Option<String>,
        /// Resolved level, if known.
        level: Option<u32>,
        /// Fetch duration in milliseconds.
        duration_ms: f64,
    },
    /// A fetch failed; the cycle was skipped.
    Failed {
        /// Tracked application.
        app_id: String,
        /// Failure kind (`transport`, `status`, `decode`).
        kind: &'static str,
        /// Error message.
        error: String,
        /// Whether the failure looks transient.
        transient: bool,
    },
    /// The fetched state is not in the stage table.
    UnknownStage {
        /// Tracked application.
        app_id: String,
        /// The unrecognised state.
        state: String,
    },
    /// The terminal marker was observed and navigation fired.
    Terminal {
        /// Tracked application.
        app_id: String,
        /// Path of the navigation target.
        route: String,
    },
    /// The session was torn down.
    Cancelled {
        /// Tracked application.
        app_id: String,
        /// Teardown reason.
        reason: String,
    },
}

impl PollEvent {
    /// Builds a failure event from a fetch error.
    #[must_use]
    pub fn failed(app_id: &str, err: &FetchError) -> Self {
        Self::Failed {
            app_id: app_id.to_string(),
            kind: err.kind(),
            error: err.to_string(),
            transient: err.is_transient(),
        }
    }

    /// The dotted event type used by sinks.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "poll.started",
            Self::Fetched { .. } => "poll.fetched",
            Self::Failed { .. } => "poll.failed",
            Self::UnknownStage { .. } => "poll.unknown_stage",
            Self::Terminal { .. } => "poll.terminal",
            Self::Cancelled { .. } => "poll.cancelled",
        }
    }

    /// The event as a JSON payload, stamped with the emission time.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(ref mut map) = value {
            map.remove("event");
            map.insert(
                "timestamp".to_string(),
                serde_json::json!(crate::utils::iso_timestamp()),
            );
        }
        value
    }
}
