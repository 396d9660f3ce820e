//! Observation-mode gateway.
//!
//! Market data (and, with a user address, balances and resting orders) come
//! from the live info endpoint. Ladder orders are kept in an in-memory book
//! and never sent; they never fill.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use ladder_core::{
    Balances, Candle, CandleInterval, Instrument, LiveOrder, MarketType, OrderId, OrderSpec, Price,
    RejectReason, Size,
};
use ladder_executor::{BoxFuture, ExchangeGateway, GatewayError, GatewayResult};
use tracing::info;

use crate::client::InfoClient;
use crate::config::VenueConfig;

/// Paper order ids start high so they never collide with venue oids in logs.
const PAPER_OID_BASE: u64 = 9_000_000_000;

pub struct PaperGateway {
    client: InfoClient,
    config: VenueConfig,
    size_decimals: u32,
    orders: parking_lot::Mutex<Vec<LiveOrder>>,
    next_order_id: AtomicU64,
}

impl PaperGateway {
    pub fn new(client: InfoClient, config: VenueConfig, size_decimals: u32) -> Self {
        Self {
            client,
            config,
            size_decimals,
            orders: parking_lot::Mutex::new(Vec::new()),
            next_order_id: AtomicU64::new(PAPER_OID_BASE),
        }
    }

    /// Key under which `allMids` reports the instrument.
    fn mid_key<'a>(&self, instrument: &'a Instrument) -> &'a str {
        if instrument.symbol.starts_with('@') {
            &instrument.symbol
        } else {
            &instrument.coin
        }
    }

    /// Coin sent in `candleSnapshot` requests.
    fn candle_key<'a>(&'a self, instrument: &'a Instrument) -> &'a str {
        match self.config.candle_coin.as_deref() {
            Some(coin) => coin,
            None => self.mid_key(instrument),
        }
    }

    /// Orders currently held in the paper book.
    pub fn paper_orders(&self) -> Vec<LiveOrder> {
        self.orders.lock().clone()
    }

    async fn balances(&self, instrument: &Instrument) -> GatewayResult<Balances> {
        let Some(user) = self.config.user_address.as_deref() else {
            return Ok(Balances::new(
                self.config.paper_coin_balance,
                self.config.paper_quote_balance,
            ));
        };
        match instrument.market_type {
            MarketType::Spot => {
                let balances = self.client.fetch_spot_balances(user).await?;
                let coin = balances.get(&instrument.coin).copied().unwrap_or_default();
                let quote = balances
                    .get(&self.config.quote_coin)
                    .copied()
                    .unwrap_or_default();
                Ok(Balances::new(coin, quote))
            }
            MarketType::Perp => {
                let account = self
                    .client
                    .fetch_perp_account(user, &instrument.symbol, self.config.dex.as_deref())
                    .await?;
                Ok(Balances::new(account.position_size, account.account_value))
            }
        }
    }

    async fn open_orders(&self, instrument: &Instrument) -> GatewayResult<Vec<LiveOrder>> {
        let mut orders = self.orders.lock().clone();
        if let Some(user) = self.config.user_address.as_deref() {
            // Real resting orders on the account occupy the order cap.
            let venue = self
                .client
                .fetch_open_orders(user, &instrument.symbol, self.config.dex.as_deref())
                .await?;
            orders.extend(venue);
        }
        Ok(orders)
    }

    fn place(&self, instrument: &Instrument, spec: &OrderSpec) -> GatewayResult<OrderId> {
        let size = Size::from_notional(spec.size_usd, spec.price, self.size_decimals);
        if size.is_zero() {
            return Err(GatewayError::Rejected(RejectReason::MinNotional));
        }
        let order_id = OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        info!(
            instrument = %instrument,
            order_id = %order_id,
            side = %spec.side,
            tier = spec.tier_index,
            price = %spec.price,
            size = %size,
            tag = %spec.client_tag,
            "Paper order placed"
        );
        self.orders.lock().push(LiveOrder {
            order_id,
            side: spec.side,
            price: spec.price,
            size,
            placed_at: Utc::now(),
            client_tag: Some(spec.client_tag.clone()),
        });
        Ok(order_id)
    }

    fn cancel(&self, order_id: OrderId) -> GatewayResult<()> {
        let mut orders = self.orders.lock();
        let before = orders.len();
        orders.retain(|o| o.order_id != order_id);
        if orders.len() == before {
            return Err(GatewayError::NotFound(order_id));
        }
        info!(order_id = %order_id, "Paper order cancelled");
        Ok(())
    }
}

impl ExchangeGateway for PaperGateway {
    fn get_mid_price<'a>(&'a self, instrument: &'a Instrument) -> BoxFuture<'a, GatewayResult<Price>> {
        Box::pin(async move {
            let key = self.mid_key(instrument);
            Ok(self.client.fetch_mid(key, self.config.dex.as_deref()).await?)
        })
    }

    fn get_candles<'a>(
        &'a self,
        instrument: &'a Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> BoxFuture<'a, GatewayResult<Vec<Candle>>> {
        Box::pin(async move {
            Ok(self
                .client
                .fetch_candles(self.candle_key(instrument), interval, count, Utc::now())
                .await?)
        })
    }

    fn get_balances<'a>(&'a self, instrument: &'a Instrument) -> BoxFuture<'a, GatewayResult<Balances>> {
        Box::pin(self.balances(instrument))
    }

    fn get_open_orders<'a>(
        &'a self,
        instrument: &'a Instrument,
    ) -> BoxFuture<'a, GatewayResult<Vec<LiveOrder>>> {
        Box::pin(self.open_orders(instrument))
    }

    fn place_order<'a>(
        &'a self,
        instrument: &'a Instrument,
        spec: &'a OrderSpec,
    ) -> BoxFuture<'a, GatewayResult<OrderId>> {
        Box::pin(async move { self.place(instrument, spec) })
    }

    fn cancel_order<'a>(
        &'a self,
        _instrument: &'a Instrument,
        order_id: OrderId,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move { self.cancel(order_id) })
    }
}
