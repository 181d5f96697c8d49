//! # Applauncher
//!
//! Provisioning progress tracking for launcher-managed applications.
//!
//! The launcher writes the current provisioning step of an application into
//! its record metadata. This crate polls that record and presents progress
//! against an ordered stage table:
//!
//! - **Stage mapping**: Resolve a state name to its ordinal level
//! - **Classification**: Mark each stage completed, current or pending
//! - **Polling sessions**: Fixed-interval fetches with prompt teardown
//! - **View model**: Read-only snapshots for any presentation layer
//! - **Navigation**: A once-only hand-off when provisioning finishes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use applauncher::prelude::*;
//!
//! let config = Arc::new(TrackerConfig::default().apply_env()?);
//! let source = Arc::new(HttpApplicationSource::new(&config)?);
//! let mut session = PollingSession::start("app-guid", config, source)?;
//!
//! let mut view = session.view_model();
//! while view.changed().await {
//!     println!("level {:?}", view.level());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod source;
pub mod testing;
pub mod tracker;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{default_stage_table, StageScheme, TrackerConfig};
    pub use crate::core::{
        Application, SessionState, Stage, StageClassification, StageTable,
    };
    pub use crate::errors::{ConfigError, FetchError, LauncherError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PollEvent,
    };
    pub use crate::observability::{init_tracing, LogFormat, LoggingConfig};
    #[cfg(feature = "http")]
    pub use crate::source::HttpApplicationSource;
    pub use crate::source::ApplicationSource;
    pub use crate::tracker::{
        ChannelNavigator, NavigationTrigger, Navigator, PollOutcome, PollingSession,
        ProgressSnapshot, ProgressViewModel, Route, SessionBuilder, StageProgress,
    };
    pub use crate::utils::{iso_timestamp, Timestamp};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn library_compiles() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stages.len(), 7);
    }
}
