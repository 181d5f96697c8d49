//! Error types for the provisioning tracker.
//!
//! Fetch failures are transient by policy: the poller logs them and tries
//! again on the next cycle. Configuration errors are reported once, before any
//! session starts.

use thiserror::Error;

/// The main error type for applauncher operations.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// The application record could not be fetched.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// The tracker configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The session was torn down before it finished.
    #[error("Session cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for LauncherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when the status endpoint did not return a usable record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Underlying client error.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The body was not a valid application record.
    #[error("Malformed application record from {url}: {message}")]
    Decode {
        /// The requested URL.
        url: String,
        /// Parser error.
        message: String,
    },
}

impl FetchError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable name of the failure.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
        }
    }

    /// Whether a later attempt could plausibly succeed.
    ///
    /// Client errors other than 404, 408 and 429 point at a request that will
    /// keep failing. The poller still retries them; this only affects how
    /// loudly they are logged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Decode { .. } => true,
            Self::Status { status, .. } => {
                !(400..500).contains(status) || matches!(*status, 404 | 408 | 429)
            }
        }
    }

    /// Converts to an event payload.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "kind": self.kind(),
            "transient": self.is_transient(),
            "message": self.to_string(),
        });
        if let Self::Status { status, .. } = self {
            payload["status"] = serde_json::json!(status);
        }
        payload
    }
}

/// Error raised when tracker configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The stage table has no entries.
    #[error("Stage table is empty")]
    EmptyStageTable,

    /// Two stages share a name.
    #[error("Duplicate stage name '{0}'")]
    DuplicateStageName(String),

    /// Two stages share an ordinal.
    #[error("Ordinal {ordinal} is used by both '{first}' and '{second}'")]
    DuplicateOrdinal {
        /// The shared ordinal.
        ordinal: u32,
        /// The stage listed first.
        first: String,
        /// The stage listed second.
        second: String,
    },

    /// A stage ordinal does not increase over its predecessor.
    #[error("Stage '{name}' has ordinal {ordinal}, which must be greater than {previous}")]
    NonMonotonic {
        /// The offending stage.
        name: String,
        /// Its ordinal.
        ordinal: u32,
        /// The ordinal it must exceed.
        previous: u32,
    },

    /// A stage uses the largest ordinal, which is kept free for the
    /// terminal marker.
    #[error("Stage '{name}' has ordinal {ordinal}, which is reserved")]
    OrdinalTooLarge {
        /// The offending stage.
        name: String,
        /// Its ordinal.
        ordinal: u32,
    },

    /// The terminal marker names a stage that is not the final one.
    #[error("Terminal marker '{0}' must be absent from the stage table or be its last stage")]
    TerminalNotLast(String),

    /// A scalar setting holds an unusable value.
    #[error("Invalid {field}: {message}")]
    Invalid {
        /// The setting name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A stage scheme name was not recognised.
    #[error("Unknown stage scheme '{0}' (expected environment_json or environment_vars)")]
    UnknownScheme(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates an invalid-setting error.
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
