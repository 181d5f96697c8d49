//! Event sink system for observability.
//!
//! The poller reports what it sees as [`PollEvent`]s; sinks decide whether to
//! log, collect or drop them.

mod poll;
mod sink;

pub use poll::PollEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Emits a poll event through a sink.
pub async fn emit_poll_event(sink: &dyn EventSink, event: &PollEvent) {
    sink.emit(event.event_type(), Some(event.payload())).await;
}
