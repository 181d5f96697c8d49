//! HTTP implementation of [`ApplicationSource`] against the launcher UI API.

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::protocol::ApplicationSource;
use crate::config::TrackerConfig;
use crate::core::Application;
use crate::errors::{ConfigError, FetchError};

/// Fetches application records over `GET /ui/apps[/:id]`.
#[derive(Debug, Clone)]
pub struct HttpApplicationSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApplicationSource {
    /// Builds a client from the tracker configuration.
    pub fn new(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ConfigError::invalid("base_url", e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::invalid(
                "base_url",
                format!("'{base_url}' cannot carry a path"),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::invalid("http client", e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the single-application endpoint. The id is percent-encoded.
    #[must_use]
    pub fn app_url(&self, app_id: &str) -> Url {
        self.endpoint(&["ui", "apps", app_id])
    }

    /// URL of the application list endpoint.
    #[must_use]
    pub fn apps_url(&self) -> Url {
        self.endpoint(&["ui", "apps"])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let url_str = url.to_string();
        debug!(url = %url_str, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(&url_str, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::status(&url_str, status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(&url_str, e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::decode(&url_str, e.to_string()))
    }
}

#[async_trait]
impl ApplicationSource for HttpApplicationSource {
    async fn fetch_application(&self, app_id: &str) -> Result<Application, FetchError> {
        self.get_json(self.app_url(app_id)).await
    }

    async fn list_applications(&self) -> Result<Vec<Application>, FetchError> {
        // An empty list is serialized as `null` by the service.
        let apps: Option<Vec<Application>> = self.get_json(self.apps_url()).await?;
        Ok(apps.unwrap_or_default())
    }
}
