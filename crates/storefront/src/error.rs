//! Unified error type for callers that drive the store end to end.
//!
//! The store itself never returns errors from reconcile operations; these
//! variants come from loading configuration, talking to the backend, and
//! setting up telemetry.

use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::SyncError;
use crate::telemetry::TelemetryError;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Telemetry could not be set up.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input was not valid JSON for the expected type.
    #[error("Invalid input: {0}")]
    Input(#[from] serde_json::Error),
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
