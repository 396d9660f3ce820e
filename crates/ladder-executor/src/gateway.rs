//! Exchange gateway abstraction.
//!
//! The engine reads market data and account state and sends placements and
//! cancellations only through `ExchangeGateway`. The account is bound to the
//! gateway instance; the instrument is passed per call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ladder_core::{
    Balances, Candle, CandleInterval, Instrument, LiveOrder, OrderId, OrderSpec, Price, Size,
};

use crate::error::{GatewayError, GatewayResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Venue operations the strategy depends on.
pub trait ExchangeGateway: Send + Sync {
    fn get_mid_price<'a>(&'a self, instrument: &'a Instrument) -> BoxFuture<'a, GatewayResult<Price>>;

    /// Up to `count` most recent bars, oldest first.
    fn get_candles<'a>(
        &'a self,
        instrument: &'a Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> BoxFuture<'a, GatewayResult<Vec<Candle>>>;

    fn get_balances<'a>(&'a self, instrument: &'a Instrument) -> BoxFuture<'a, GatewayResult<Balances>>;

    fn get_open_orders<'a>(
        &'a self,
        instrument: &'a Instrument,
    ) -> BoxFuture<'a, GatewayResult<Vec<LiveOrder>>>;

    /// Place a resting limit order. The gateway converts `spec.size_usd` to base size.
    fn place_order<'a>(
        &'a self,
        instrument: &'a Instrument,
        spec: &'a OrderSpec,
    ) -> BoxFuture<'a, GatewayResult<OrderId>>;

    /// Cancel by venue id. `NotFound` / `AlreadyFilled` mean nothing is left resting.
    fn cancel_order<'a>(
        &'a self,
        instrument: &'a Instrument,
        order_id: OrderId,
    ) -> BoxFuture<'a, GatewayResult<()>>;
}

/// Arc wrapper for gateway trait objects.
pub type DynGateway = Arc<dyn ExchangeGateway>;

/// Gateway operation, used to script failures on the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    MidPrice,
    Candles,
    Balances,
    OpenOrders,
    Place,
    Cancel,
}

/// A call observed by `MockGateway`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    MidPrice,
    Candles { interval: CandleInterval, count: usize },
    Balances,
    OpenOrders,
    Place(OrderSpec),
    Cancel(OrderId),
}

#[derive(Debug)]
struct MockBook {
    mid_price: Price,
    candles: Vec<Candle>,
    balances: Balances,
    orders: Vec<LiveOrder>,
    filled: HashSet<OrderId>,
    next_order_id: u64,
    now: DateTime<Utc>,
}

/// In-memory gateway for tests.
///
/// Placed orders rest in the mock book until cancelled or marked filled.
/// Failures are scripted per operation and consumed in order.
#[derive(Debug)]
pub struct MockGateway {
    book: parking_lot::Mutex<MockBook>,
    failures: parking_lot::Mutex<HashMap<GatewayCall, VecDeque<GatewayError>>>,
    calls: parking_lot::Mutex<Vec<RecordedCall>>,
    /// Artificial latency on every call.
    latency: parking_lot::Mutex<Option<Duration>>,
    size_decimals: u32,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create a mock with an empty book, zero mid and zero balances.
    pub fn new() -> Self {
        Self {
            book: parking_lot::Mutex::new(MockBook {
                mid_price: Price::ZERO,
                candles: Vec::new(),
                balances: Balances::default(),
                orders: Vec::new(),
                filled: HashSet::new(),
                next_order_id: 1,
                now: Utc::now(),
            }),
            failures: parking_lot::Mutex::new(HashMap::new()),
            calls: parking_lot::Mutex::new(Vec::new()),
            latency: parking_lot::Mutex::new(None),
            size_decimals: 8,
        }
    }

    pub fn set_mid_price(&self, mid: Price) {
        self.book.lock().mid_price = mid;
    }

    pub fn set_candles(&self, candles: Vec<Candle>) {
        self.book.lock().candles = candles;
    }

    pub fn set_balances(&self, balances: Balances) {
        self.book.lock().balances = balances;
    }

    /// Timestamp given to newly placed orders.
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.book.lock().now = now;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Put an order directly into the book (e.g. a manual order).
    pub fn insert_order(&self, order: LiveOrder) {
        let mut book = self.book.lock();
        book.next_order_id = book.next_order_id.max(order.order_id.0 + 1);
        book.orders.push(order);
    }

    /// Remove an order from the book as if it had filled.
    pub fn fill_order(&self, order_id: OrderId) {
        let mut book = self.book.lock();
        book.orders.retain(|o| o.order_id != order_id);
        book.filled.insert(order_id);
    }

    /// Queue a failure for the next call of `call`.
    pub fn fail_next(&self, call: GatewayCall, error: GatewayError) {
        self.failures.lock().entry(call).or_default().push_back(error);
    }

    /// Current resting orders.
    pub fn open_orders(&self) -> Vec<LiveOrder> {
        self.book.lock().orders.clone()
    }

    /// Recorded calls, in call order.
    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of recorded calls matching `call`.
    pub fn call_count(&self, call: GatewayCall) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| {
                matches!(
                    (call, c),
                    (GatewayCall::MidPrice, RecordedCall::MidPrice)
                        | (GatewayCall::Candles, RecordedCall::Candles { .. })
                        | (GatewayCall::Balances, RecordedCall::Balances)
                        | (GatewayCall::OpenOrders, RecordedCall::OpenOrders)
                        | (GatewayCall::Place, RecordedCall::Place(_))
                        | (GatewayCall::Cancel, RecordedCall::Cancel(_))
                )
            })
            .count()
    }

    /// Record the call, wait out any latency, then pop a scripted failure.
    async fn enter(&self, call: GatewayCall, record: RecordedCall) -> GatewayResult<()> {
        self.calls.lock().push(record);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.failures.lock().get_mut(&call).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ExchangeGateway for MockGateway {
    fn get_mid_price<'a>(&'a self, _instrument: &'a Instrument) -> BoxFuture<'a, GatewayResult<Price>> {
        Box::pin(async move {
            self.enter(GatewayCall::MidPrice, RecordedCall::MidPrice).await?;
            Ok(self.book.lock().mid_price)
        })
    }

    fn get_candles<'a>(
        &'a self,
        _instrument: &'a Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> BoxFuture<'a, GatewayResult<Vec<Candle>>> {
        Box::pin(async move {
            self.enter(GatewayCall::Candles, RecordedCall::Candles { interval, count })
                .await?;
            let book = self.book.lock();
            let start = book.candles.len().saturating_sub(count);
            Ok(book.candles[start..].to_vec())
        })
    }

    fn get_balances<'a>(&'a self, _instrument: &'a Instrument) -> BoxFuture<'a, GatewayResult<Balances>> {
        Box::pin(async move {
            self.enter(GatewayCall::Balances, RecordedCall::Balances).await?;
            Ok(self.book.lock().balances)
        })
    }

    fn get_open_orders<'a>(
        &'a self,
        _instrument: &'a Instrument,
    ) -> BoxFuture<'a, GatewayResult<Vec<LiveOrder>>> {
        Box::pin(async move {
            self.enter(GatewayCall::OpenOrders, RecordedCall::OpenOrders).await?;
            Ok(self.book.lock().orders.clone())
        })
    }

    fn place_order<'a>(
        &'a self,
        _instrument: &'a Instrument,
        spec: &'a OrderSpec,
    ) -> BoxFuture<'a, GatewayResult<OrderId>> {
        Box::pin(async move {
            self.enter(GatewayCall::Place, RecordedCall::Place(spec.clone()))
                .await?;
            let mut book = self.book.lock();
            let order_id = OrderId(book.next_order_id);
            book.next_order_id += 1;
            let placed_at = book.now;
            book.orders.push(LiveOrder {
                order_id,
                side: spec.side,
                price: spec.price,
                size: Size::from_notional(spec.size_usd, spec.price, self.size_decimals),
                placed_at,
                client_tag: Some(spec.client_tag.clone()),
            });
            Ok(order_id)
        })
    }

    fn cancel_order<'a>(
        &'a self,
        _instrument: &'a Instrument,
        order_id: OrderId,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            self.enter(GatewayCall::Cancel, RecordedCall::Cancel(order_id))
                .await?;
            let mut book = self.book.lock();
            if book.filled.contains(&order_id) {
                return Err(GatewayError::AlreadyFilled(order_id));
            }
            let before = book.orders.len();
            book.orders.retain(|o| o.order_id != order_id);
            if book.orders.len() == before {
                return Err(GatewayError::NotFound(order_id));
            }
            Ok(())
        })
    }
}
