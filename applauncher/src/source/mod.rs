//! Application record sources.
//!
//! This module provides:
//! - The [`ApplicationSource`] trait the poller fetches through
//! - An HTTP implementation against the launcher UI API (feature `http`)

#[cfg(feature = "http")]
mod http;
mod protocol;

#[cfg(feature = "http")]
pub use http::HttpApplicationSource;
pub use protocol::ApplicationSource;
