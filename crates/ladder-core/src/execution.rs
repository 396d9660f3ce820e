//! Order lifecycle types shared by the engine and the gateway.
//!
//! - `LiveOrder`: local mirror of an order resting at the venue
//! - `OrderSpec`: placement intent emitted by the reconciler
//! - `RejectReason`: why the venue refused a placement

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Price, Size};
use crate::order::{ClientTag, OrderId, OrderSide};

/// An order currently open at the venue, as read from the open-order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveOrder {
    pub order_id: OrderId,
    pub side: OrderSide,
    pub price: Price,
    /// Remaining size in base units.
    pub size: Size,
    pub placed_at: DateTime<Utc>,
    /// Absent for orders placed without a client tag (manual orders).
    pub client_tag: Option<ClientTag>,
}

impl LiveOrder {
    /// Remaining notional in quote currency.
    pub fn size_usd(&self) -> Decimal {
        self.size.notional(self.price)
    }

    /// Age relative to `now`; clock skew never yields a negative age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.placed_at).max(Duration::zero())
    }

    /// `(side, tier)` if the order carries a tag issued under `prefix`.
    pub fn ladder_slot(&self, prefix: &str) -> Option<(OrderSide, u8)> {
        self.client_tag.as_ref().and_then(|t| t.parse(prefix))
    }

    /// Whether the order belongs to the ladder identified by `prefix`.
    pub fn is_managed_by(&self, prefix: &str) -> bool {
        self.ladder_slot(prefix).is_some()
    }
}

/// A placement the reconciler wants the gateway to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub side: OrderSide,
    pub price: Price,
    /// Target notional in quote currency; the gateway converts to base size.
    pub size_usd: Decimal,
    pub tier_index: u8,
    pub client_tag: ClientTag,
}

/// Reason the venue rejected an order placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Not enough balance or margin.
    InsufficientBalance,
    /// Post-only order would have crossed the book.
    WouldCross,
    /// Below the venue's minimum order value.
    MinNotional,
    /// Price outside the venue's allowed band or not on tick.
    BadPrice,
    /// Venue rate limit hit; retryable.
    RateLimited,
    /// Anything else the venue reported.
    Other(String),
}

impl RejectReason {
    /// Whether a retry within the same cycle can succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "insufficient_balance",
            Self::WouldCross => "would_cross",
            Self::MinNotional => "min_notional",
            Self::BadPrice => "bad_price",
            Self::RateLimited => "rate_limited",
            Self::Other(_) => "other",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(msg) => write!(f, "other: {msg}"),
            _ => f.write_str(self.label()),
        }
    }
}
