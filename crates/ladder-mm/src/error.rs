//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MmError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {needed} candles, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type MmResult<T> = Result<T, MmError>;
