//! Telemetry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Bad filter directives, or a global subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Encoding the registry to text failed.
    #[error("Failed to export metrics: {0}")]
    Metrics(String),

    /// Binding or serving the exporter socket.
    #[error("Metrics server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
