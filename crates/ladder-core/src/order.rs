//! Order sides and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Both sides, bid first.
    pub const ALL: [OrderSide; 2] = [OrderSide::Buy, OrderSide::Sell];

    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Single-letter code used inside client tags.
    fn code(&self) -> char {
        match self {
            Self::Buy => 'b',
            Self::Sell => 's',
        }
    }

    fn from_code(c: char) -> Option<Self> {
        match c {
            'b' => Some(Self::Buy),
            's' => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client tag marking an order as ladder-managed.
///
/// Format: `{prefix}-{b|s}{tier}-{uuid_short}`. The prefix identifies the
/// ladder that owns the order; side and tier are recoverable from the tag
/// so the live-order mirror can be rebuilt from venue state alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientTag(String);

impl ClientTag {
    /// Create a new unique tag for a ladder tier.
    pub fn new(prefix: &str, side: OrderSide, tier_index: u8) -> Self {
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("{prefix}-{}{tier_index}-{uuid_short}", side.code()))
    }

    /// Wrap a tag string received from the venue.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this tag was issued under `prefix`.
    pub fn is_managed_by(&self, prefix: &str) -> bool {
        self.parse(prefix).is_some()
    }

    /// Recover `(side, tier_index)` if the tag was issued under `prefix`.
    pub fn parse(&self, prefix: &str) -> Option<(OrderSide, u8)> {
        let rest = self.0.strip_prefix(prefix)?.strip_prefix('-')?;
        let (side_tier, suffix) = rest.split_once('-')?;
        if suffix.is_empty() {
            return None;
        }
        let mut chars = side_tier.chars();
        let side = OrderSide::from_code(chars.next()?)?;
        let tier = chars.as_str().parse::<u8>().ok()?;
        Some((side, tier))
    }
}

impl fmt::Display for ClientTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientTag {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for ClientTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_client_tag_unique() {
        let a = ClientTag::new("ladder", OrderSide::Buy, 0);
        let b = ClientTag::new("ladder", OrderSide::Buy, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_client_tag_roundtrip_side_and_tier() {
        let tag = ClientTag::new("ladder", OrderSide::Sell, 3);
        assert!(tag.as_str().starts_with("ladder-s3-"));
        assert_eq!(tag.parse("ladder"), Some((OrderSide::Sell, 3)));
    }

    #[test]
    fn test_foreign_tags_are_not_managed() {
        let manual = ClientTag::from_string("manual-order".to_string());
        assert!(!manual.is_managed_by("ladder"));

        // Prefix must be followed by the separator, not just share a stem.
        let other = ClientTag::from_string("ladderx-b0-1234abcd".to_string());
        assert!(!other.is_managed_by("ladder"));

        let bad_side = ClientTag::from_string("ladder-x0-1234abcd".to_string());
        assert!(!bad_side.is_managed_by("ladder"));
    }
}
