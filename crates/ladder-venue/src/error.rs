//! Venue error types.

use ladder_executor::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Not found in response: {0}")]
    Missing(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type VenueResult<T> = Result<T, VenueError>;

impl From<VenueError> for GatewayError {
    fn from(err: VenueError) -> Self {
        match err {
            VenueError::HttpClient(msg) => GatewayError::Transport(msg),
            VenueError::Status { status: 429, .. } => GatewayError::RateLimited,
            VenueError::Status { status, body } if status >= 500 => {
                GatewayError::Transport(format!("HTTP {status}: {body}"))
            }
            other => GatewayError::Decode(other.to_string()),
        }
    }
}
