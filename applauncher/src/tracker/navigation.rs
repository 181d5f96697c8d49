//! Navigation out of the progress view once provisioning finishes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A client-side route bound to an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// The provisioning progress view.
    Provision {
        /// Tracked application.
        app_id: String,
    },
    /// The finished application view.
    View {
        /// Tracked application.
        app_id: String,
    },
}

impl Route {
    /// Route name as registered with the router.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Provision { .. } => "app-provision",
            Self::View { .. } => "app-view",
        }
    }

    /// The application the route is bound to.
    #[must_use]
    pub fn app_id(&self) -> &str {
        match self {
            Self::Provision { app_id } | Self::View { app_id } => app_id,
        }
    }

    /// URL path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Provision { app_id } => format!("/app/provision/{app_id}"),
            Self::View { app_id } => format!("/app/view/{app_id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// The routing layer the trigger hands control to.
///
/// `navigate` runs while the session state is locked and must not call back
/// into the session.
pub trait Navigator: Send + Sync {
    /// Switches the user to `route`.
    fn navigate(&self, route: Route);
}

/// Forwards routes over a channel, for UIs running their own event loop.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    /// Creates a navigator and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        if self.tx.send(route).is_err() {
            debug!("Navigation receiver dropped");
        }
    }
}

/// Fires navigation to the view route at most once.
pub struct NavigationTrigger {
    navigator: Arc<dyn Navigator>,
    fired: AtomicBool,
}

impl NavigationTrigger {
    /// Creates an unfired trigger.
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            fired: AtomicBool::new(false),
        }
    }

    /// Navigates to the view route of `app_id`.
    ///
    /// Returns the route on the first call and `None` on every later one.
    pub fn fire(&self, app_id: &str) -> Option<Route> {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let route = Route::View {
            app_id: app_id.to_string(),
        };
        info!(app_id = %app_id, route = %route, "Provisioning finished, navigating");
        self.navigator.navigate(route.clone());
        Some(route)
    }

    /// Whether the trigger has fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for NavigationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationTrigger")
            .field("fired", &self.has_fired())
            .finish_non_exhaustive()
    }
}
