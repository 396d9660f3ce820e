//! Precision-safe decimal types for quoting.
//!
//! Prices and sizes wrap `rust_decimal::Decimal` so ladder arithmetic
//! (`mid * (1 - spread)`) stays exact and the two cannot be mixed up.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Price in quote currency with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Round down to a multiple of `tick_size` (bid side).
    #[inline]
    pub fn floor_to_tick(&self, tick_size: Decimal) -> Self {
        if tick_size <= Decimal::ZERO {
            return *self;
        }
        Self((self.0 / tick_size).floor() * tick_size)
    }

    /// Round up to a multiple of `tick_size` (ask side).
    #[inline]
    pub fn ceil_to_tick(&self, tick_size: Decimal) -> Self {
        if tick_size <= Decimal::ZERO {
            return *self;
        }
        Self((self.0 / tick_size).ceil() * tick_size)
    }

    /// Absolute distance to another price.
    #[inline]
    pub fn distance(&self, other: Price) -> Decimal {
        (self.0 - other.0).abs()
    }

    /// Signed basis-point offset from `reference`.
    #[inline]
    pub fn bps_from(&self, reference: Price) -> Option<Decimal> {
        if reference.0.is_zero() {
            return None;
        }
        Some((self.0 - reference.0) / reference.0 * Decimal::from(10_000))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Order size in base units (coins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Base size for a USD notional at `price`, truncated to `size_decimals`.
    ///
    /// Returns `Size::ZERO` for a non-positive price.
    pub fn from_notional(notional_usd: Decimal, price: Price, size_decimals: u32) -> Self {
        if !price.is_positive() {
            return Self::ZERO;
        }
        Self((notional_usd / price.0).trunc_with_scale(size_decimals))
    }

    /// Notional value: size * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}
