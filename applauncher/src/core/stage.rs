//! Ordered provisioning stages and the level lookup over them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::status::StageClassification;
use crate::errors::ConfigError;

/// A named lifecycle stage with its position in the provisioning sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stage {
    /// The backend state name, e.g. `uploading`.
    pub name: String,
    /// Position in the sequence, starting at 1.
    pub ordinal: u32,
}

impl Stage {
    /// Creates a new stage.
    #[must_use]
    pub fn new(name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.ordinal, self.name)
    }
}

/// An immutable, validated, ordered list of stages.
///
/// Ordinals are unique, start at 1 or above, and strictly increase in list
/// order. Lookups never consult server data beyond matching a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    /// Builds a table from explicit `(name, ordinal)` entries.
    pub fn new(stages: Vec<Stage>) -> Result<Self, ConfigError> {
        if stages.is_empty() {
            return Err(ConfigError::EmptyStageTable);
        }

        let mut names = HashSet::with_capacity(stages.len());
        for stage in &stages {
            if !names.insert(stage.name.as_str()) {
                return Err(ConfigError::DuplicateStageName(stage.name.clone()));
            }
        }

        for (i, stage) in stages.iter().enumerate() {
            if let Some(first) = stages[..i].iter().find(|s| s.ordinal == stage.ordinal) {
                return Err(ConfigError::DuplicateOrdinal {
                    ordinal: stage.ordinal,
                    first: first.name.clone(),
                    second: stage.name.clone(),
                });
            }
        }

        let mut previous = 0;
        for stage in &stages {
            if stage.ordinal == u32::MAX {
                return Err(ConfigError::OrdinalTooLarge {
                    name: stage.name.clone(),
                    ordinal: stage.ordinal,
                });
            }
            if stage.ordinal <= previous {
                return Err(ConfigError::NonMonotonic {
                    name: stage.name.clone(),
                    ordinal: stage.ordinal,
                    previous,
                });
            }
            previous = stage.ordinal;
        }

        Ok(Self { stages })
    }

    /// Wraps a list already known to satisfy the table invariants.
    pub(crate) fn from_ordered(stages: Vec<Stage>) -> Self {
        debug_assert!(Self::new(stages.clone()).is_ok());
        Self { stages }
    }

    /// Builds a table from names in chronological order, numbered from 1.
    pub fn from_names<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stages = names
            .into_iter()
            .zip(1u32..)
            .map(|(name, ordinal)| Stage::new(name, ordinal))
            .collect();
        Self::new(stages)
    }

    /// Returns the ordinal of a backend state, or `None` if the state is not a
    /// known stage.
    #[must_use]
    pub fn level_of(&self, state: &str) -> Option<u32> {
        self.get(state).map(|stage| stage.ordinal)
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == name)
    }

    /// Classifies a named stage against a level.
    #[must_use]
    pub fn classify(&self, name: &str, level: Option<u32>) -> Option<StageClassification> {
        self.get(name)
            .map(|stage| StageClassification::classify(stage.ordinal, level))
    }

    /// The stages in order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Iterates over the stages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    /// The final stage.
    #[must_use]
    pub fn last(&self) -> &Stage {
        // non-empty by construction
        &self.stages[self.stages.len() - 1]
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a constructed table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl TryFrom<Vec<Stage>> for StageTable {
    type Error = ConfigError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        Self::new(stages)
    }
}

impl From<StageTable> for Vec<Stage> {
    fn from(table: StageTable) -> Self {
        table.stages
    }
}

impl<'a> IntoIterator for &'a StageTable {
    type Item = &'a Stage;
    type IntoIter = std::slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}
