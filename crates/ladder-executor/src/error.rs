//! Gateway error types.

use std::time::Duration;

use ladder_core::{OrderId, RejectReason};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Order rejected: {0}")]
    Rejected(RejectReason),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Order already filled: {0}")]
    AlreadyFilled(OrderId),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether retrying the same call can succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) | Self::RateLimited => true,
            Self::Rejected(reason) => reason.is_transient(),
            Self::NotFound(_) | Self::AlreadyFilled(_) | Self::Decode(_) => false,
        }
    }

    /// A cancel that failed this way leaves nothing resting at the venue.
    #[must_use]
    pub fn is_order_gone(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::AlreadyFilled(_))
    }

    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::RateLimited => "rate_limited",
            Self::Rejected(reason) => reason.label(),
            Self::NotFound(_) => "not_found",
            Self::AlreadyFilled(_) => "already_filled",
            Self::Decode(_) => "decode",
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
