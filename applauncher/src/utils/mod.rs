//! Small shared helpers.

pub mod timestamps;

pub use timestamps::{elapsed_ms, format_timestamp, iso_timestamp, Timestamp};
