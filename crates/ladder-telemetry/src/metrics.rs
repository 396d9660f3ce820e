//! Prometheus metrics for the ladder market maker.
//!
//! # Panics
//!
//! Registration uses `unwrap()`: a failure means duplicate metric names,
//! which is a startup bug. It only happens on first access of a static.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram,
    register_int_gauge_vec, Counter, CounterVec, Encoder, Gauge, Histogram, IntGaugeVec,
    TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Cycles by outcome (completed/skipped).
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_cycles_total",
        "Reconciliation cycles by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Skipped cycles by the input that could not be read.
pub static CYCLE_SKIPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_cycle_skips_total",
        "Skipped cycles by reason",
        &["reason"]
    )
    .unwrap()
});

pub static CYCLE_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ladder_cycle_duration_seconds",
        "Wall time of one reconciliation cycle",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap()
});

pub static ORDERS_PLACED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_orders_placed_total",
        "Ladder orders placed",
        &["side"]
    )
    .unwrap()
});

/// Labels: side, reason (stale/unmatched).
pub static ORDERS_CANCELLED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_orders_cancelled_total",
        "Ladder orders cancelled",
        &["side", "reason"]
    )
    .unwrap()
});

/// Labels: op (place/cancel), reason (gateway error label).
pub static ORDER_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_order_failures_total",
        "Order operations that failed after retries",
        &["op", "reason"]
    )
    .unwrap()
});

/// Labels: op (place/cancel).
pub static ORDERS_DEFERRED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_orders_deferred_total",
        "Order operations left for the next cycle",
        &["op"]
    )
    .unwrap()
});

pub static MID_PRICE: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("ladder_mid_price", "Last mid price").unwrap());

pub static VOL_MULTIPLIER: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "ladder_vol_multiplier",
        "Volatility multiplier applied to the base spread"
    )
    .unwrap()
});

pub static VOL_FALLBACK_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "ladder_vol_fallback_total",
        "Cycles that used the neutral multiplier for lack of candles"
    )
    .unwrap()
});

pub static SKEW_FACTOR: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("ladder_skew_factor", "Inventory skew factor").unwrap());

pub static COIN_RATIO: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "ladder_coin_ratio",
        "Coin share of portfolio value (spot) or position utilisation (perp)"
    )
    .unwrap()
});

pub static LIVE_ORDERS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "ladder_live_orders",
        "Live orders per side at the start of the last cycle",
        &["side"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn cycle_completed(duration_secs: f64) {
        CYCLES_TOTAL.with_label_values(&["completed"]).inc();
        CYCLE_DURATION_SECONDS.observe(duration_secs);
    }

    pub fn cycle_skipped(reason: &str, duration_secs: f64) {
        CYCLES_TOTAL.with_label_values(&["skipped"]).inc();
        CYCLE_SKIPS_TOTAL.with_label_values(&[reason]).inc();
        CYCLE_DURATION_SECONDS.observe(duration_secs);
    }

    pub fn order_placed(side: &str) {
        ORDERS_PLACED_TOTAL.with_label_values(&[side]).inc();
    }

    pub fn order_cancelled(side: &str, reason: &str) {
        ORDERS_CANCELLED_TOTAL
            .with_label_values(&[side, reason])
            .inc();
    }

    pub fn order_failed(op: &str, reason: &str) {
        ORDER_FAILURES_TOTAL.with_label_values(&[op, reason]).inc();
    }

    pub fn order_deferred(op: &str) {
        ORDERS_DEFERRED_TOTAL.with_label_values(&[op]).inc();
    }

    pub fn mid_price(mid: f64) {
        MID_PRICE.set(mid);
    }

    /// Record the applied multiplier; `fallback` marks a neutral 1.0.
    pub fn vol_multiplier(multiplier: f64, fallback: bool) {
        VOL_MULTIPLIER.set(multiplier);
        if fallback {
            VOL_FALLBACK_TOTAL.inc();
        }
    }

    pub fn inventory(coin_ratio: f64, skew_factor: f64) {
        COIN_RATIO.set(coin_ratio);
        SKEW_FACTOR.set(skew_factor);
    }

    pub fn live_orders(side: &str, count: usize) {
        LIVE_ORDERS
            .with_label_values(&[side])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Render the default registry in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_counters() {
        let before = CYCLES_TOTAL.with_label_values(&["skipped"]).get();
        Metrics::cycle_skipped("mid_price", 0.2);
        let after = CYCLES_TOTAL.with_label_values(&["skipped"]).get();
        assert_eq!(after - before, 1.0);
        assert!(CYCLE_SKIPS_TOTAL.with_label_values(&["mid_price"]).get() >= 1.0);
    }

    #[test]
    fn test_fallback_only_counts_when_flagged() {
        let before = VOL_FALLBACK_TOTAL.get();
        Metrics::vol_multiplier(1.7, false);
        assert_eq!(VOL_FALLBACK_TOTAL.get(), before);
        Metrics::vol_multiplier(1.0, true);
        assert_eq!(VOL_FALLBACK_TOTAL.get(), before + 1.0);
    }

    #[test]
    fn test_render_contains_recorded_series() {
        Metrics::order_placed("buy");
        Metrics::order_cancelled("sell", "stale");
        Metrics::live_orders("buy", 3);

        let text = Metrics::render().unwrap();
        assert!(text.contains("ladder_orders_placed_total{side=\"buy\"}"));
        assert!(text.contains("ladder_orders_cancelled_total{reason=\"stale\",side=\"sell\"}"));
        assert!(text.contains("ladder_live_orders"));
    }
}
