//! Tracker configuration and stage scheme presets.

mod scheme;
mod tracker;

pub use scheme::{default_stage_table, StageScheme, FINISHED_MARKER, PROVISIONING_STAGES};
pub use tracker::{TrackerConfig, ENV_API_URL, ENV_POLL_INTERVAL, ENV_SCHEME};
