//! The boundary between the tracker and the provisioning service.

use async_trait::async_trait;

use crate::core::Application;
use crate::errors::FetchError;

/// Where application records come from.
///
/// The tracker only needs [`fetch_application`](Self::fetch_application);
/// listing exists for tooling around it.
#[async_trait]
pub trait ApplicationSource: Send + Sync {
    /// Fetches the current record of one application.
    async fn fetch_application(&self, app_id: &str) -> Result<Application, FetchError>;

    /// Fetches every application visible to the caller.
    async fn list_applications(&self) -> Result<Vec<Application>, FetchError>;
}
