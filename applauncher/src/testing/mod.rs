//! Testing utilities for progress tracking.
//!
//! This module provides:
//! - A scripted application source with call counting
//! - A navigator that records every route it is handed
//! - Record builders for launcher-managed applications

mod mocks;

pub use mocks::{app_with_state, RecordingNavigator, ScriptedSource};
