//! Instrument identity and market data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::Price;
use crate::error::CoreError;

/// Kind of market the ladder is quoted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    /// Coin held against a quote balance; inventory is the coin share of the account.
    #[default]
    Spot,
    /// Signed perpetual position; inventory is the position relative to the position cap.
    Perp,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Perp => write!(f, "perp"),
        }
    }
}

/// The single instrument a run quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Venue symbol used for orders and mids (e.g. "@142", "BTC", "xyz:XYZ100").
    pub symbol: String,
    /// Coin name used for candles and balances (e.g. "BTC").
    pub coin: String,
    pub market_type: MarketType,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, coin: impl Into<String>, market_type: MarketType) -> Self {
        Self {
            symbol: symbol.into(),
            coin: coin.into(),
            market_type,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.market_type, self.symbol)
    }
}

/// Candle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[default]
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl CandleInterval {
    /// Interval length in milliseconds.
    pub fn as_millis(&self) -> u64 {
        match self {
            Self::OneMinute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::FifteenMinutes => 900_000,
            Self::OneHour => 3_600_000,
            Self::FourHours => 14_400_000,
            Self::OneDay => 86_400_000,
        }
    }

    /// Wire name ("5m", "1h", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::OneMinute),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1h" => Ok(Self::OneHour),
            "4h" => Ok(Self::FourHours),
            "1d" => Ok(Self::OneDay),
            other => Err(CoreError::InvalidInterval(other.to_string())),
        }
    }
}

/// One OHLC bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time (Unix milliseconds).
    pub open_time_ms: u64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    pub fn new(open_time_ms: u64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            open_time_ms,
            open,
            high,
            low,
            close,
        }
    }

    /// True range against the previous bar's close.
    pub fn true_range(&self, prev_close: Decimal) -> Decimal {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Account balances for the instrument.
///
/// Spot: `coin` and `quote` are both non-negative holdings.
/// Perp: `coin` is the signed position size, `quote` the account value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub coin: Decimal,
    pub quote: Decimal,
}

impl Balances {
    pub fn new(coin: Decimal, quote: Decimal) -> Self {
        Self { coin, quote }
    }
}

/// Market data read at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub mid_price: Price,
    /// Ordered bars, newest last.
    pub candles: Vec<Candle>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_true_range_uses_gap_to_prev_close() {
        let bar = Candle::new(0, dec!(105), dec!(106), dec!(104), dec!(105));
        // Plain range is 2, but the gap up from 100 dominates.
        assert_eq!(bar.true_range(dec!(100)), dec!(6));
        // Gap down from 110.
        assert_eq!(bar.true_range(dec!(110)), dec!(6));
        // Inside bar.
        assert_eq!(bar.true_range(dec!(105)), dec!(2));
    }

    #[test]
    fn test_interval_parse_and_millis() {
        let interval: CandleInterval = "5m".parse().unwrap();
        assert_eq!(interval, CandleInterval::FiveMinutes);
        assert_eq!(interval.as_millis(), 300_000);
        assert!("7m".parse::<CandleInterval>().is_err());
    }

    #[test]
    fn test_interval_serde_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            interval: CandleInterval,
        }
        let w: Wrapper = toml::from_str("interval = \"1h\"").unwrap();
        assert_eq!(w.interval, CandleInterval::OneHour);
    }
}
