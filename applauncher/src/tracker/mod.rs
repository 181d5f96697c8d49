//! Progress tracking for a provisioning application.
//!
//! A [`PollingSession`] owns one poll loop. The loop fetches the record,
//! maps its state onto the stage table, publishes a [`ProgressSnapshot`] and
//! waits the poll interval before the next fetch. When the terminal marker is
//! observed the [`NavigationTrigger`] hands the user to the view route,
//! exactly once, and the loop ends.
//!
//! ```rust,ignore
//! let session = PollingSession::builder(app_id, config, source)
//!     .with_navigator(navigator)
//!     .start()?;
//! let mut view = session.view_model();
//! while view.changed().await {
//!     for row in view.stages() {
//!         println!("{} {}", row.classification, row.name);
//!     }
//! }
//! ```

mod navigation;
mod poller;
mod session;
mod view_model;

#[cfg(test)]
mod integration_tests;

pub use navigation::{ChannelNavigator, NavigationTrigger, Navigator, Route};
pub use poller::PollOutcome;
pub use session::{PollingSession, SessionBuilder};
pub use view_model::{ProgressSnapshot, ProgressViewModel, StageProgress};
