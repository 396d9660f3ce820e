//! HTTP client for the Hyperliquid info endpoint.
//!
//! Read-only: mids, candles, spot and perp account state, open orders.
//! Every request is a POST of `{"type": ...}` to the info URL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ladder_core::{Candle, CandleInterval, ClientTag, LiveOrder, OrderId, OrderSide, Price, Size};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{VenueError, VenueResult};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw candle from `candleSnapshot`.
#[derive(Debug, Deserialize)]
struct RawCandle {
    /// Open time (ms).
    t: u64,
    o: Decimal,
    h: Decimal,
    l: Decimal,
    c: Decimal,
}

#[derive(Debug, Deserialize)]
struct RawSpotBalance {
    coin: String,
    total: Decimal,
}

#[derive(Debug, Deserialize)]
struct RawSpotState {
    #[serde(default)]
    balances: Vec<RawSpotBalance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    coin: String,
    szi: Decimal,
    #[serde(default)]
    entry_px: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct RawAssetPosition {
    position: RawPosition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMarginSummary {
    account_value: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClearinghouseState {
    #[serde(default)]
    asset_positions: Vec<RawAssetPosition>,
    margin_summary: RawMarginSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOpenOrder {
    coin: String,
    /// "B" = bid, "A" = ask.
    side: String,
    limit_px: Decimal,
    sz: Decimal,
    oid: u64,
    timestamp: i64,
    #[serde(default)]
    cloid: Option<String>,
}

/// Perp account state for one coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerpAccount {
    /// Signed position size (positive = long).
    pub position_size: Decimal,
    pub entry_price: Option<Decimal>,
    pub account_value: Decimal,
}

/// Client for the info endpoint.
pub struct InfoClient {
    client: Client,
    info_url: String,
}

impl InfoClient {
    /// Create a new info client.
    ///
    /// # Arguments
    /// * `info_url` - URL of the info endpoint (e.g., "https://api.hyperliquid.xyz/info")
    pub fn new(info_url: impl Into<String>) -> VenueResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| VenueError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            info_url: info_url.into(),
        })
    }

    pub fn info_url(&self) -> &str {
        &self.info_url
    }

    async fn post<T: DeserializeOwned>(&self, request: &Value) -> VenueResult<T> {
        let response = self
            .client
            .post(&self.info_url)
            .json(request)
            .send()
            .await
            .map_err(|e| VenueError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VenueError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VenueError::Decode(format!("Failed to parse response: {e}")))?;
        Ok(serde_json::from_value(body)?)
    }

    /// All mid prices keyed by coin or spot pair (`@index`).
    ///
    /// `dex` selects a builder-deployed perp dex; `None` is the main dex.
    pub async fn fetch_all_mids(&self, dex: Option<&str>) -> VenueResult<HashMap<String, Decimal>> {
        let mut request = json!({ "type": "allMids" });
        if let Some(dex) = dex {
            request["dex"] = json!(dex);
        }
        self.post(&request).await
    }

    /// Mid price for one key of `allMids`.
    pub async fn fetch_mid(&self, key: &str, dex: Option<&str>) -> VenueResult<Price> {
        let mids = self.fetch_all_mids(dex).await?;
        mid_from(&mids, key)
    }

    /// The most recent `count` bars ending at `end`, oldest first.
    pub async fn fetch_candles(
        &self,
        coin: &str,
        interval: CandleInterval,
        count: usize,
        end: DateTime<Utc>,
    ) -> VenueResult<Vec<Candle>> {
        let end_ms = end.timestamp_millis().max(0) as u64;
        let start_ms = end_ms.saturating_sub(interval.as_millis() * count as u64);
        let request = json!({
            "type": "candleSnapshot",
            "req": {
                "coin": coin,
                "interval": interval.as_str(),
                "startTime": start_ms,
                "endTime": end_ms,
            }
        });
        let raw: Vec<RawCandle> = self.post(&request).await?;
        debug!(coin, interval = %interval, bars = raw.len(), "Candles fetched");
        Ok(candles_from(raw, count))
    }

    /// Spot balances (`total`) keyed by token name.
    pub async fn fetch_spot_balances(&self, user: &str) -> VenueResult<HashMap<String, Decimal>> {
        let request = json!({ "type": "spotClearinghouseState", "user": user });
        let state: RawSpotState = self.post(&request).await?;
        Ok(state
            .balances
            .into_iter()
            .map(|b| (b.coin, b.total))
            .collect())
    }

    /// Perp position for `coin` and the account value.
    pub async fn fetch_perp_account(
        &self,
        user: &str,
        coin: &str,
        dex: Option<&str>,
    ) -> VenueResult<PerpAccount> {
        let mut request = json!({ "type": "clearinghouseState", "user": user });
        if let Some(dex) = dex {
            request["dex"] = json!(dex);
        }
        let state: RawClearinghouseState = self.post(&request).await?;
        Ok(perp_account_from(state, coin))
    }

    /// Open orders of `user` on `symbol`, on the builder dex when given.
    pub async fn fetch_open_orders(
        &self,
        user: &str,
        symbol: &str,
        dex: Option<&str>,
    ) -> VenueResult<Vec<LiveOrder>> {
        let request = open_orders_request(user, dex);
        let raw: Vec<RawOpenOrder> = self.post(&request).await?;
        open_orders_from(raw, symbol)
    }
}

fn open_orders_request(user: &str, dex: Option<&str>) -> Value {
    let mut request = json!({ "type": "openOrders", "user": user });
    if let Some(dex) = dex {
        request["dex"] = json!(dex);
    }
    request
}

fn mid_from(mids: &HashMap<String, Decimal>, key: &str) -> VenueResult<Price> {
    let mid = mids
        .get(key)
        .copied()
        .ok_or_else(|| VenueError::Missing(format!("mid for {key}")))?;
    Ok(Price::new(mid))
}

fn candles_from(raw: Vec<RawCandle>, count: usize) -> Vec<Candle> {
    let mut candles: Vec<Candle> = raw
        .into_iter()
        .map(|c| Candle::new(c.t, c.o, c.h, c.l, c.c))
        .collect();
    candles.sort_by_key(|c| c.open_time_ms);
    let start = candles.len().saturating_sub(count);
    candles.split_off(start)
}

fn perp_account_from(state: RawClearinghouseState, coin: &str) -> PerpAccount {
    let position = state
        .asset_positions
        .into_iter()
        .map(|p| p.position)
        .find(|p| p.coin == coin);
    PerpAccount {
        position_size: position.as_ref().map(|p| p.szi).unwrap_or(Decimal::ZERO),
        entry_price: position.and_then(|p| p.entry_px),
        account_value: state.margin_summary.account_value,
    }
}

fn open_orders_from(raw: Vec<RawOpenOrder>, symbol: &str) -> VenueResult<Vec<LiveOrder>> {
    raw.into_iter()
        .filter(|o| o.coin == symbol)
        .map(|o| {
            let side = match o.side.as_str() {
                "B" => OrderSide::Buy,
                "A" => OrderSide::Sell,
                other => return Err(VenueError::Decode(format!("unknown order side {other}"))),
            };
            let placed_at = DateTime::from_timestamp_millis(o.timestamp)
                .ok_or_else(|| VenueError::Decode(format!("bad timestamp {}", o.timestamp)))?;
            Ok(LiveOrder {
                order_id: OrderId(o.oid),
                side,
                price: Price::new(o.limit_px),
                size: Size::new(o.sz),
                placed_at,
                client_tag: o.cloid.map(ClientTag::from_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_all_mids() {
        let body = json!({ "BTC": "100123.5", "@142": "99990.0" });
        let mids: HashMap<String, Decimal> = serde_json::from_value(body).unwrap();
        assert_eq!(mid_from(&mids, "@142").unwrap(), Price::new(dec!(99990.0)));
        assert!(matches!(mid_from(&mids, "ETH"), Err(VenueError::Missing(_))));
    }

    #[test]
    fn test_parse_candles_sorted_and_trimmed() {
        let body = json!([
            { "t": 600000, "T": 899999, "s": "BTC", "i": "5m", "o": "101", "h": "103", "l": "100", "c": "102", "v": "1.5", "n": 10 },
            { "t": 0, "T": 299999, "s": "BTC", "i": "5m", "o": "99", "h": "101", "l": "98", "c": "100", "v": "2", "n": 12 },
            { "t": 300000, "T": 599999, "s": "BTC", "i": "5m", "o": "100", "h": "102", "l": "99", "c": "101", "v": "3", "n": 8 }
        ]);
        let raw: Vec<RawCandle> = serde_json::from_value(body).unwrap();
        let candles = candles_from(raw, 2);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time_ms, 300000);
        assert_eq!(candles[1].close, dec!(102));
    }

    #[test]
    fn test_parse_spot_state() {
        let body = json!({
            "balances": [
                { "coin": "USDC", "token": 0, "hold": "0.0", "total": "5012.5", "entryNtl": "0.0" },
                { "coin": "UBTC", "token": 197, "hold": "0.001", "total": "0.0523", "entryNtl": "5000.0" }
            ]
        });
        let state: RawSpotState = serde_json::from_value(body).unwrap();
        let map: HashMap<String, Decimal> = state.balances.into_iter().map(|b| (b.coin, b.total)).collect();
        assert_eq!(map["USDC"], dec!(5012.5));
        assert_eq!(map["UBTC"], dec!(0.0523));
    }

    #[test]
    fn test_parse_perp_state() {
        let body = json!({
            "assetPositions": [
                { "type": "oneWay", "position": { "coin": "ETH", "szi": "1.2", "entryPx": "3000.0" } },
                { "type": "oneWay", "position": { "coin": "BTC", "szi": "-0.05", "entryPx": "100000.0" } }
            ],
            "marginSummary": { "accountValue": "25000.0", "totalNtlPos": "8600.0" }
        });
        let state: RawClearinghouseState = serde_json::from_value(body).unwrap();
        let account = perp_account_from(state, "BTC");
        assert_eq!(account.position_size, dec!(-0.05));
        assert_eq!(account.entry_price, Some(dec!(100000.0)));
        assert_eq!(account.account_value, dec!(25000.0));
    }

    #[test]
    fn test_flat_perp_position() {
        let body = json!({ "assetPositions": [], "marginSummary": { "accountValue": "100" } });
        let state: RawClearinghouseState = serde_json::from_value(body).unwrap();
        let account = perp_account_from(state, "BTC");
        assert_eq!(account.position_size, Decimal::ZERO);
        assert_eq!(account.entry_price, None);
    }

    #[test]
    fn test_parse_open_orders_filters_symbol() {
        let body = json!([
            { "coin": "@142", "side": "B", "limitPx": "99900.0", "sz": "0.0015", "oid": 11, "timestamp": 1_700_000_000_000i64 },
            { "coin": "@142", "side": "A", "limitPx": "100100.0", "sz": "0.0015", "oid": 12, "timestamp": 1_700_000_000_000i64, "cloid": "ladder-s0-0a1b2c3d" },
            { "coin": "ETH", "side": "B", "limitPx": "3000.0", "sz": "1", "oid": 13, "timestamp": 1_700_000_000_000i64 }
        ]);
        let raw: Vec<RawOpenOrder> = serde_json::from_value(body).unwrap();
        let orders = open_orders_from(raw, "@142").unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, OrderSide::Buy);
        assert_eq!(orders[0].client_tag, None);
        assert_eq!(orders[1].ladder_slot("ladder"), Some((OrderSide::Sell, 0)));
        assert_eq!(orders[1].placed_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_open_orders_request_carries_dex() {
        let request = open_orders_request("0xabc", Some("xyz"));
        assert_eq!(request["type"], "openOrders");
        assert_eq!(request["dex"], "xyz");

        let default_dex = open_orders_request("0xabc", None);
        assert!(default_dex.get("dex").is_none());
    }

    #[test]
    fn test_unknown_side_rejected() {
        let body = json!([
            { "coin": "BTC", "side": "X", "limitPx": "1", "sz": "1", "oid": 1, "timestamp": 0 }
        ]);
        let raw: Vec<RawOpenOrder> = serde_json::from_value(body).unwrap();
        assert!(open_orders_from(raw, "BTC").is_err());
    }
}
