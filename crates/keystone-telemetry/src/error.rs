//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The base level is not a valid filter.
    #[error("invalid log level '{level}': {message}")]
    InvalidLevel {
        /// The rejected level string.
        level: String,
        /// Parser message.
        message: String,
    },

    /// A per-target directive could not be parsed.
    #[error("invalid log directive '{directive}': {message}")]
    InvalidDirective {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// The format name is not recognised.
    #[error("unknown log format '{0}' (expected pretty, compact, json or full)")]
    InvalidFormat(String),

    /// A global subscriber is already installed.
    #[error("Initialization error: {0}")]
    InitError(String),

    /// The log directory could not be created.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
