//! The application record returned by the status endpoint.

use serde::{Deserialize, Serialize};

/// Metadata field that marks an application as launcher-managed.
pub const LAUNCHER_NAME_FIELD: &str = "APP_LAUNCHER_NAME";

/// Metadata field holding the provisioning state.
pub const LAUNCHER_STATE_FIELD: &str = "APP_LAUNCHER_STATE";

/// An application as reported by the provisioning service.
///
/// Only the identifier and the metadata map are interpreted. The map sits
/// under a deployment-specific key (`environment_json` or `environment_vars`),
/// so every field the record does not name explicitly is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Opaque application identifier.
    #[serde(alias = "id")]
    pub guid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Space the application lives in.
    #[serde(default)]
    pub space: String,
    /// Organization owning the space.
    #[serde(default)]
    pub org: String,
    /// Remaining fields, including the metadata map.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Application {
    /// Creates a record with no metadata.
    #[must_use]
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: String::new(),
            space: String::new(),
            org: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets one string entry in the metadata map under `metadata_key`.
    #[must_use]
    pub fn with_metadata(
        mut self,
        metadata_key: &str,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let entry = self
            .extra
            .entry(metadata_key.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = serde_json::Value::Object(serde_json::Map::new());
        }
        if let serde_json::Value::Object(map) = entry {
            map.insert(field.into(), serde_json::Value::String(value.into()));
        }
        self
    }

    /// The metadata map stored under `metadata_key`, if it is an object.
    #[must_use]
    pub fn metadata(&self, metadata_key: &str) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.extra.get(metadata_key).and_then(serde_json::Value::as_object)
    }

    /// Reads a string field from the metadata map.
    #[must_use]
    pub fn metadata_str(&self, metadata_key: &str, field: &str) -> Option<&str> {
        self.metadata(metadata_key)
            .and_then(|map| map.get(field))
            .and_then(serde_json::Value::as_str)
    }

    /// The provisioning state, read from `field` in the metadata map.
    #[must_use]
    pub fn state(&self, metadata_key: &str, field: &str) -> Option<&str> {
        self.metadata_str(metadata_key, field)
    }

    /// Whether the application was created by the launcher.
    #[must_use]
    pub fn is_launcher_app(&self, metadata_key: &str) -> bool {
        self.metadata_str(metadata_key, LAUNCHER_NAME_FIELD)
            .is_some_and(|name| !name.is_empty())
    }
}
