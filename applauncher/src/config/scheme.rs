//! Stage naming schemes observed across launcher deployments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{Stage, StageTable};
use crate::errors::ConfigError;

/// The provisioning sequence shared by both schemes, in order.
pub const PROVISIONING_STAGES: [&str; 7] = [
    "creating",
    "uploading",
    "provision_cloudera",
    "provision_db",
    "bind_services",
    "restarting_atk",
    "create_user",
];

/// Terminal marker written by deployments using `environment_vars`.
pub const FINISHED_MARKER: &str = "finished";

/// A preset combining a stage table, the metadata key holding the state, and
/// an optional terminal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageScheme {
    /// State under `environment_json`; no terminal marker is ever written.
    EnvironmentJson,
    /// State under `environment_vars`; completion is reported as `finished`.
    EnvironmentVars,
}

impl Default for StageScheme {
    fn default() -> Self {
        Self::EnvironmentVars
    }
}

impl StageScheme {
    /// All known schemes.
    pub const ALL: [Self; 2] = [Self::EnvironmentJson, Self::EnvironmentVars];

    /// Key of the metadata map in the application record.
    #[must_use]
    pub const fn metadata_key(&self) -> &'static str {
        match self {
            Self::EnvironmentJson => "environment_json",
            Self::EnvironmentVars => "environment_vars",
        }
    }

    /// The state value that ends provisioning, if the scheme has one.
    #[must_use]
    pub const fn terminal_marker(&self) -> Option<&'static str> {
        match self {
            Self::EnvironmentJson => None,
            Self::EnvironmentVars => Some(FINISHED_MARKER),
        }
    }

    /// The stage table of the scheme.
    #[must_use]
    pub fn stage_table(&self) -> StageTable {
        default_stage_table()
    }
}

impl fmt::Display for StageScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metadata_key())
    }
}

impl FromStr for StageScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment_json" | "json" | "legacy" => Ok(Self::EnvironmentJson),
            "environment_vars" | "vars" | "current" => Ok(Self::EnvironmentVars),
            _ => Err(ConfigError::UnknownScheme(s.to_string())),
        }
    }
}

/// The seven-stage provisioning table.
#[must_use]
pub fn default_stage_table() -> StageTable {
    let stages = PROVISIONING_STAGES
        .iter()
        .zip(1u32..)
        .map(|(name, ordinal)| Stage::new(*name, ordinal))
        .collect();
    StageTable::from_ordered(stages)
}
