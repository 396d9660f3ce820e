//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Venue error: {0}")]
    Venue(#[from] ladder_venue::VenueError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ladder_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
