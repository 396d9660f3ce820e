//! ATR-based volatility multiplier.
//!
//! True range per bar is `max(high - low, |high - prev_close|, |low - prev_close|)`.
//! ATR uses Wilder smoothing: seeded with the simple mean of the first
//! `period` true ranges, then `atr += (tr - atr) / period` for every later bar.
//! Only the trailing `period + 1 + warmup` bars are read, so the result is a
//! pure function of that window.
//!
//! **Mapping**: `multiplier = clamp((atr / mid) / base_spread, min, max)`.
//! A market whose per-bar range equals `base_spread` of mid quotes the
//! configured spreads unchanged; twice that range doubles them.

use ladder_core::{Candle, Price};
use rust_decimal::Decimal;

use crate::config::LadderConfig;
use crate::error::{MmError, MmResult};

/// Result of one volatility estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatilityReading {
    pub atr: Decimal,
    /// ATR as a fraction of mid.
    pub atr_pct: Decimal,
    /// Spread multiplier, within `[vol_multiplier_min, vol_multiplier_max]`.
    pub multiplier: Decimal,
}

/// Converts a candle series into a bounded spread multiplier.
#[derive(Debug, Clone)]
pub struct VolatilityEstimator {
    period: usize,
    warmup_bars: usize,
    base_spread: Decimal,
    min_multiplier: Decimal,
    max_multiplier: Decimal,
}

impl VolatilityEstimator {
    pub fn new(config: &LadderConfig) -> Self {
        Self {
            period: config.atr_period,
            warmup_bars: config.atr_warmup_bars,
            base_spread: config.base_spread,
            min_multiplier: config.vol_multiplier_min,
            max_multiplier: config.vol_multiplier_max,
        }
    }

    /// Estimate the spread multiplier from `candles` (oldest first).
    ///
    /// Fails with `InsufficientData` below `period + 1` bars and with
    /// `InvalidInput` for a non-positive mid.
    pub fn estimate(&self, candles: &[Candle], mid_price: Price) -> MmResult<VolatilityReading> {
        if !mid_price.is_positive() {
            return Err(MmError::InvalidInput(format!(
                "mid price must be positive, got {mid_price}"
            )));
        }
        let atr = self.atr(candles)?;
        let atr_pct = atr / mid_price.inner();
        let raw = atr_pct / self.base_spread;
        Ok(VolatilityReading {
            atr,
            atr_pct,
            multiplier: raw.clamp(self.min_multiplier, self.max_multiplier),
        })
    }

    /// Wilder-smoothed average true range over the trailing window.
    pub fn atr(&self, candles: &[Candle]) -> MmResult<Decimal> {
        let needed = self.period + 1;
        if self.period == 0 || candles.len() < needed {
            return Err(MmError::InsufficientData {
                needed,
                got: candles.len(),
            });
        }

        let window = needed + self.warmup_bars;
        let start = candles.len().saturating_sub(window);
        let bars = &candles[start..];

        let true_ranges: Vec<Decimal> = bars
            .windows(2)
            .map(|pair| pair[1].true_range(pair[0].close))
            .collect();

        let period = Decimal::from(self.period as u64);
        let (seed, rest) = true_ranges.split_at(self.period);
        let mut atr = seed.iter().sum::<Decimal>() / period;
        for tr in rest {
            atr += (*tr - atr) / period;
        }
        Ok(atr)
    }
}
