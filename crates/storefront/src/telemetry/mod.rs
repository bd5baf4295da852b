//! Fire-and-forget analytics for cart and wishlist transitions.
//!
//! # Architecture
//!
//! - [`TelemetryEvent`] - named event with `{value, currency, items}` params
//! - [`TelemetrySink`] - where events go ([`HttpSink`], [`LogSink`])
//! - [`TelemetryQueue`] - detached worker between the store and the sink
//!
//! Telemetry never blocks or fails a store mutation. A mutation that has
//! been applied stays applied whatever happens to its events.

mod event;
mod queue;
mod sink;

pub use event::{EventItem, EventName, EventParams, TelemetryEvent};
pub use queue::TelemetryQueue;
pub use sink::{HttpSink, LogSink, TelemetrySink};

use thiserror::Error;

use crate::config::TelemetryConfig;

/// Errors that can occur when delivering telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with a non-success status.
    #[error("Collector rejected event: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// API key cannot be sent as a header.
    #[error("Invalid API key: {0}")]
    InvalidKey(String),
}

/// Build the queue described by `config`.
///
/// Events go to the collector when an endpoint is configured, otherwise to
/// the log. Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns error if the HTTP sink cannot be built.
pub fn queue_from_config(config: &TelemetryConfig) -> Result<TelemetryQueue, TelemetryError> {
    let queue = match &config.endpoint {
        Some(endpoint) => {
            let sink = HttpSink::new(endpoint.clone(), config)?;
            TelemetryQueue::spawn(sink, config.delay, config.queue_capacity)
        }
        None => TelemetryQueue::spawn(LogSink, config.delay, config.queue_capacity),
    };
    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_error_display() {
        let err = TelemetryError::Rejected {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Collector rejected event: 503 - unavailable");
    }
}
