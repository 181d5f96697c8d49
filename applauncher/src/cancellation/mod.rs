//! Cooperative cancellation for polling sessions.

mod token;

pub use token::CancellationToken;
