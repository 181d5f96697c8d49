//! Core domain model types.
//!
//! This module contains the fundamental types used throughout the tracker:
//! - The application record fetched from the provisioning service
//! - The ordered stage table and its level lookup
//! - Stage classification and session state enums

mod application;
mod stage;
mod status;

pub use application::{Application, LAUNCHER_NAME_FIELD, LAUNCHER_STATE_FIELD};
pub use stage::{Stage, StageTable};
pub use status::{SessionState, StageClassification};
