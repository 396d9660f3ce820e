//! Venue connection settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where market data comes from and which account is observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Info endpoint URL.
    #[serde(default = "default_info_url")]
    pub info_url: String,

    /// Order / mid symbol: spot pair index ("@142"), perp coin ("BTC"),
    /// or builder perp ("xyz:XYZ100").
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Coin name for spot balances and the perp position.
    #[serde(default = "default_coin")]
    pub coin: String,

    /// `candleSnapshot` coin. Defaults to the mid key (`symbol` for spot
    /// pairs, `coin` otherwise); set it to read another market's bars,
    /// e.g. "BTC" perp candles for a UBTC spot ladder.
    #[serde(default)]
    pub candle_coin: Option<String>,

    /// Quote token for spot balances.
    #[serde(default = "default_quote_coin")]
    pub quote_coin: String,

    /// Builder-deployed perp dex name, if any.
    #[serde(default)]
    pub dex: Option<String>,

    /// Account to read balances and resting orders from.
    /// Without it the paper balances below are used.
    #[serde(default)]
    pub user_address: Option<String>,

    #[serde(default)]
    pub paper_coin_balance: Decimal,

    #[serde(default)]
    pub paper_quote_balance: Decimal,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            info_url: default_info_url(),
            symbol: default_symbol(),
            coin: default_coin(),
            candle_coin: None,
            quote_coin: default_quote_coin(),
            dex: None,
            user_address: None,
            paper_coin_balance: Decimal::ZERO,
            paper_quote_balance: Decimal::ZERO,
        }
    }
}

fn default_info_url() -> String {
    "https://api.hyperliquid.xyz/info".to_string()
}
fn default_symbol() -> String {
    "BTC".to_string()
}
fn default_coin() -> String {
    "BTC".to_string()
}
fn default_quote_coin() -> String {
    "USDC".to_string()
}
