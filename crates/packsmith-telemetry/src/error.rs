//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration error (bad filter directive, unusable log directory).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber was already installed.
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
