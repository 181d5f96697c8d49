//! Stage classification and session state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single stage relates to the current provisioning level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageClassification {
    /// The stage is the one currently running.
    Current,
    /// The stage finished earlier.
    Completed,
    /// The stage has not started, or the current level is unknown.
    Pending,
}

impl StageClassification {
    /// Classifies a stage ordinal against the current level.
    ///
    /// An absent level means nothing is current or completed.
    ///
    /// # Examples
    ///
    /// ```
    /// use applauncher::core::StageClassification;
    ///
    /// assert_eq!(StageClassification::classify(5, Some(5)), StageClassification::Current);
    /// assert_eq!(StageClassification::classify(2, Some(5)), StageClassification::Completed);
    /// assert_eq!(StageClassification::classify(6, Some(5)), StageClassification::Pending);
    /// assert_eq!(StageClassification::classify(1, None), StageClassification::Pending);
    /// ```
    #[must_use]
    pub const fn classify(ordinal: u32, level: Option<u32>) -> Self {
        match level {
            Some(level) if ordinal == level => Self::Current,
            Some(level) if ordinal < level => Self::Completed,
            _ => Self::Pending,
        }
    }

    /// Returns true if the stage is finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the stage is in progress.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for StageClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Completed => write!(f, "completed"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Lifecycle of a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created but the poll loop has not run yet.
    Idle,
    /// Fetching on the configured interval.
    Polling,
    /// The terminal marker was observed.
    Terminal,
    /// Torn down before reaching the terminal marker.
    Cancelled,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Polling => write!(f, "polling"),
            Self::Terminal => write!(f, "terminal"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl SessionState {
    /// Returns true if no further transition can happen.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Terminal | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_equal_is_current() {
        for level in [1, 4, 7, u32::MAX] {
            assert_eq!(
                StageClassification::classify(level, Some(level)),
                StageClassification::Current
            );
        }
    }

    #[test]
    fn test_classify_total_over_small_grid() {
        for ordinal in 0..10 {
            for level in 0..10 {
                let expected = if ordinal == level {
                    StageClassification::Current
                } else if ordinal < level {
                    StageClassification::Completed
                } else {
                    StageClassification::Pending
                };
                assert_eq!(StageClassification::classify(ordinal, Some(level)), expected);
            }
            assert_eq!(
                StageClassification::classify(ordinal, None),
                StageClassification::Pending
            );
        }
    }

    #[test]
    fn test_classify_is_stable() {
        let first = StageClassification::classify(3, Some(5));
        for _ in 0..5 {
            assert_eq!(StageClassification::classify(3, Some(5)), first);
        }
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(StageClassification::Current.to_string(), "current");
        assert_eq!(StageClassification::Completed.to_string(), "completed");
        assert_eq!(StageClassification::Pending.to_string(), "pending");
    }

    #[test]
    fn test_session_state_is_final() {
        assert!(SessionState::Terminal.is_final());
        assert!(SessionState::Cancelled.is_final());
        assert!(!SessionState::Idle.is_final());
        assert!(!SessionState::Polling.is_final());
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_session_state_serialize() {
        let json = serde_json::to_string(&SessionState::Terminal).unwrap();
        assert_eq!(json, r#""terminal""#);

        let state: SessionState = serde_json::from_str(r#""polling""#).unwrap();
        assert_eq!(state, SessionState::Polling);
    }
}
