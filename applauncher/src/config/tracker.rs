//! Tracker configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::scheme::{default_stage_table, StageScheme};
use crate::core::{StageTable, LAUNCHER_STATE_FIELD};
use crate::errors::{ConfigError, LauncherError};

/// Environment variable overriding the service base URL.
pub const ENV_API_URL: &str = "APPLAUNCHER_API_URL";
/// Environment variable overriding the poll interval (humantime, e.g. `5s`).
pub const ENV_POLL_INTERVAL: &str = "APPLAUNCHER_POLL_INTERVAL";
/// Environment variable selecting a stage scheme.
pub const ENV_SCHEME: &str = "APPLAUNCHER_SCHEME";

/// Configuration for a provisioning tracker.
///
/// The stage table, the metadata key and the terminal marker differ between
/// deployments, so all three are data rather than code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the launcher UI service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds between the end of one fetch and the start of the next.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: f64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Key of the metadata map in the application record.
    #[serde(default = "default_metadata_key")]
    pub metadata_key: String,
    /// Field of the metadata map holding the state.
    #[serde(default = "default_state_field")]
    pub state_field: String,
    /// State value that ends provisioning.
    #[serde(default = "default_terminal_marker")]
    pub terminal_marker: Option<String>,
    /// Ordered stage table.
    #[serde(default = "default_stage_table")]
    pub stages: StageTable,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_poll_interval() -> f64 {
    5.0
}

fn default_timeout() -> f64 {
    30.0
}

fn default_user_agent() -> String {
    format!("applauncher/{}", env!("CARGO_PKG_VERSION"))
}

fn default_metadata_key() -> String {
    StageScheme::default().metadata_key().to_string()
}

fn default_state_field() -> String {
    LAUNCHER_STATE_FIELD.to_string()
}

fn default_terminal_marker() -> Option<String> {
    StageScheme::default().terminal_marker().map(str::to_string)
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_seconds: default_poll_interval(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            metadata_key: default_metadata_key(),
            state_field: default_state_field(),
            terminal_marker: default_terminal_marker(),
            stages: default_stage_table(),
        }
    }
}

impl TrackerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for a preset scheme.
    #[must_use]
    pub fn for_scheme(scheme: StageScheme) -> Self {
        Self::default().with_scheme(scheme)
    }

    /// Applies a preset scheme: stage table, metadata key and terminal marker.
    #[must_use]
    pub fn with_scheme(mut self, scheme: StageScheme) -> Self {
        self.metadata_key = scheme.metadata_key().to_string();
        self.terminal_marker = scheme.terminal_marker().map(str::to_string);
        self.stages = scheme.stage_table();
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_seconds = interval.as_secs_f64();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the metadata key.
    #[must_use]
    pub fn with_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.metadata_key = key.into();
        self
    }

    /// Sets the state field.
    #[must_use]
    pub fn with_state_field(mut self, field: impl Into<String>) -> Self {
        self.state_field = field.into();
        self
    }

    /// Sets or clears the terminal marker.
    #[must_use]
    pub fn with_terminal_marker(mut self, marker: Option<String>) -> Self {
        self.terminal_marker = marker;
        self
    }

    /// Replaces the stage table.
    #[must_use]
    pub fn with_stages(mut self, stages: StageTable) -> Self {
        self.stages = stages;
        self
    }

    /// Gets the poll interval as Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_poll_interval()))
    }

    /// Gets the request timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout()))
    }

    /// Whether `state` is the terminal marker.
    #[must_use]
    pub fn is_terminal(&self, state: &str) -> bool {
        self.terminal_marker.as_deref() == Some(state)
    }

    /// Level of a fetched state.
    ///
    /// Plain table lookup, except that a terminal marker outside the table
    /// sits one past the final stage so every stage reads as completed.
    #[must_use]
    pub fn resolve_level(&self, state: &str) -> Option<u32> {
        self.stages.level_of(state).or_else(|| {
            if self.is_terminal(state) {
                // ordinals stop below u32::MAX, so this never overflows
                self.stages.last().ordinal.checked_add(1)
            } else {
                None
            }
        })
    }

    /// Checks the scalar settings and the terminal marker placement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("base_url", "must not be empty"));
        }
        if !self.poll_interval_seconds.is_finite()
            || self.poll_interval_seconds <= 0.0
            || self.poll_interval().is_zero()
        {
            return Err(ConfigError::invalid(
                "poll_interval_seconds",
                format!("must be positive, got {}", self.poll_interval_seconds),
            ));
        }
        if !self.timeout_seconds.is_finite()
            || self.timeout_seconds <= 0.0
            || self.timeout().is_zero()
        {
            return Err(ConfigError::invalid(
                "timeout_seconds",
                format!("must be positive, got {}", self.timeout_seconds),
            ));
        }
        if self.metadata_key.is_empty() {
            return Err(ConfigError::invalid("metadata_key", "must not be empty"));
        }
        if self.state_field.is_empty() {
            return Err(ConfigError::invalid("state_field", "must not be empty"));
        }
        if let Some(marker) = &self.terminal_marker {
            if marker.is_empty() {
                return Err(ConfigError::invalid("terminal_marker", "must not be empty"));
            }
            if self.stages.get(marker).is_some() && self.stages.last().name != *marker {
                return Err(ConfigError::TerminalNotLast(marker.clone()));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LauncherError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// The scheme is applied first so explicit URL and interval values win.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(scheme) = lookup(ENV_SCHEME) {
            self = self.with_scheme(scheme.parse()?);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(interval) = lookup(ENV_POLL_INTERVAL) {
            let parsed = humantime::parse_duration(&interval)
                .map_err(|e| ConfigError::invalid("poll_interval", e.to_string()))?;
            self = self.with_poll_interval(parsed);
        }
        self.validate()?;
        Ok(self)
    }
}
