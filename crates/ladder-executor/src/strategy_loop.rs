//! Tick-driven strategy loop.
//!
//! `Idle → Reconciling` on every tick, `Reconciling → Idle` when the cycle
//! finishes. A cycle re-reads everything from the gateway:
//!
//! ```text
//! mid → candles → balances → open orders
//!   → volatility + inventory → ladder → reconcile → dispatch
//! ```
//!
//! Failing to read any input skips the cycle with no orders touched.
//! Too few candles is not a skip: the multiplier falls back to 1.0.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use ladder_core::{Instrument, MarketSnapshot, OrderSide, Price};
use ladder_mm::{
    build_ladder, InventoryManager, InventorySkew, InventoryState, LadderConfig, MmError,
    OrderReconciler, VolatilityEstimator, VolatilityReading,
};
use rust_decimal::Decimal;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dispatch::{DispatchReport, IntentDispatcher};
use crate::error::GatewayError;
use crate::gateway::DynGateway;
use crate::retry::{with_retry, RetryPolicy};

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Reconciling,
}

/// Input read at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    MidPrice,
    Candles,
    Balances,
    OpenOrders,
}

impl FetchStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MidPrice => "mid_price",
            Self::Candles => "candles",
            Self::Balances => "balances",
            Self::OpenOrders => "open_orders",
        }
    }
}

/// Why a cycle did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DataUnavailable { stage: FetchStage, error: GatewayError },
    InvalidMarketData(String),
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::DataUnavailable { stage, .. } => stage.label(),
            Self::InvalidMarketData(_) => "invalid_market_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Summary of one cycle, consumed by logging and metrics.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    pub mid_price: Option<Price>,
    pub volatility: Option<VolatilityReading>,
    /// Multiplier actually applied (1.0 on fallback).
    pub vol_multiplier: Decimal,
    /// Too few candles; the neutral multiplier was used.
    pub vol_fallback: bool,
    pub skew: Option<InventorySkew>,
    /// Managed + foreign live orders per side as read this cycle.
    pub live_bids: usize,
    pub live_asks: usize,
    pub kept: usize,
    pub skipped_over_cap: usize,
    pub dispatch: DispatchReport,
    pub elapsed: Duration,
}

impl CycleReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            outcome: CycleOutcome::Completed,
            mid_price: None,
            volatility: None,
            vol_multiplier: Decimal::ONE,
            vol_fallback: false,
            skew: None,
            live_bids: 0,
            live_asks: 0,
            kept: 0,
            skipped_over_cap: 0,
            dispatch: DispatchReport::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn live_orders(&self, side: OrderSide) -> usize {
        match side {
            OrderSide::Buy => self.live_bids,
            OrderSide::Sell => self.live_asks,
        }
    }
}

/// Drives one reconciliation cycle per tick for a single instrument.
pub struct StrategyLoop {
    config: LadderConfig,
    instrument: Instrument,
    gateway: DynGateway,
    retry: RetryPolicy,
    dispatcher: IntentDispatcher,
    volatility: VolatilityEstimator,
    inventory: InventoryManager,
    reconciler: OrderReconciler,
    state: LoopState,
}

impl StrategyLoop {
    /// `config` must already be validated.
    pub fn new(
        config: LadderConfig,
        instrument: Instrument,
        gateway: DynGateway,
        retry: RetryPolicy,
        dispatch_deadline: Duration,
    ) -> Self {
        Self {
            volatility: VolatilityEstimator::new(&config),
            inventory: InventoryManager::new(),
            reconciler: OrderReconciler::new(&config),
            dispatcher: IntentDispatcher::new(gateway.clone(), retry, dispatch_deadline),
            config,
            instrument,
            gateway,
            retry,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Tick every `check_interval_s` until `shutdown` fires. An in-flight
    /// cycle always runs to completion; `on_cycle` sees every report.
    pub async fn run<F>(&mut self, shutdown: CancellationToken, mut on_cycle: F)
    where
        F: FnMut(&CycleReport) + Send,
    {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.check_interval_s));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            instrument = %self.instrument,
            interval_s = self.config.check_interval_s,
            tiers = self.config.tier_count(),
            "Strategy loop started"
        );

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Strategy loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_cycle(Utc::now()).await;
                    on_cycle(&report);
                }
            }
        }
    }

    /// Run one full cycle at `now`.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.state = LoopState::Reconciling;
        let started = Instant::now();
        let mut report = CycleReport::new(now);

        if let Err(reason) = self.reconcile_once(now, &mut report).await {
            warn!(
                instrument = %self.instrument,
                reason = reason.label(),
                detail = ?reason,
                "Cycle skipped"
            );
            report.outcome = CycleOutcome::Skipped(reason);
        }

        report.elapsed = started.elapsed();
        self.state = LoopState::Idle;

        if report.outcome == CycleOutcome::Completed {
            let skew = report.skew.unwrap_or_else(InventorySkew::neutral);
            info!(
                mid = %report.mid_price.unwrap_or(Price::ZERO),
                vol_multiplier = %report.vol_multiplier,
                vol_fallback = report.vol_fallback,
                skew = %skew.skew_factor,
                coin_ratio = %skew.coin_ratio,
                kept = report.kept,
                placed = report.dispatch.placed(),
                cancelled = report.dispatch.cancelled(),
                failed = report.dispatch.place_failures() + report.dispatch.cancel_failures(),
                deferred = report.dispatch.deferred(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Cycle completed"
            );
        }
        report
    }

    /// Mid price and candles. A non-positive mid is unusable.
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot, SkipReason> {
        let gateway = &self.gateway;
        let instrument = &self.instrument;

        let mid_price = with_retry(&self.retry, "get_mid_price", move || {
            gateway.get_mid_price(instrument)
        })
        .await
        .map_err(unavailable(FetchStage::MidPrice))?;
        if !mid_price.is_positive() {
            return Err(SkipReason::InvalidMarketData(format!(
                "non-positive mid price {mid_price}"
            )));
        }

        let interval = self.config.atr_interval;
        let count = self.config.candle_fetch_count();
        let candles = with_retry(&self.retry, "get_candles", move || {
            gateway.get_candles(instrument, interval, count)
        })
        .await
        .map_err(unavailable(FetchStage::Candles))?;

        Ok(MarketSnapshot { mid_price, candles })
    }

    async fn reconcile_once(
        &self,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<(), SkipReason> {
        let gateway = &self.gateway;
        let instrument = &self.instrument;

        let snapshot = self.fetch_snapshot().await?;
        let mid_price = snapshot.mid_price;
        report.mid_price = Some(mid_price);

        match self.volatility.estimate(&snapshot.candles, mid_price) {
            Ok(reading) => {
                report.vol_multiplier = reading.multiplier;
                report.volatility = Some(reading);
            }
            Err(MmError::InsufficientData { needed, got }) => {
                warn!(needed, got, "Not enough candles for ATR, using neutral multiplier");
                report.vol_multiplier = Decimal::ONE;
                report.vol_fallback = true;
            }
            Err(e) => return Err(SkipReason::InvalidMarketData(e.to_string())),
        }

        let balances = with_retry(&self.retry, "get_balances", move || {
            gateway.get_balances(instrument)
        })
        .await
        .map_err(unavailable(FetchStage::Balances))?;

        let live = with_retry(&self.retry, "get_open_orders", move || {
            gateway.get_open_orders(instrument)
        })
        .await
        .map_err(unavailable(FetchStage::OpenOrders))?;
        report.live_bids = live.iter().filter(|o| o.side == OrderSide::Buy).count();
        report.live_asks = live.len() - report.live_bids;

        let skew = self
            .inventory
            .evaluate(&InventoryState::new(balances, mid_price), &self.config);
        report.skew = Some(skew);

        let intent = build_ladder(mid_price, report.vol_multiplier, &skew, &self.config);
        let plan = self.reconciler.reconcile(&intent, &live, now);
        report.kept = plan.kept.len();
        report.skipped_over_cap = plan.skipped_over_cap;

        if !plan.is_empty() {
            report.dispatch = self.dispatcher.execute(instrument, &plan).await;
        }
        Ok(())
    }
}

fn unavailable(stage: FetchStage) -> impl FnOnce(GatewayError) -> SkipReason {
    move |error| SkipReason::DataUnavailable { stage, error }
}
