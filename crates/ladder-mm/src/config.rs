//! Ladder strategy configuration.
//!
//! One immutable `LadderConfig` per run, passed by reference into every
//! engine call. `validate()` runs once at startup; the engine assumes a
//! validated config afterwards.

use ladder_core::{CandleInterval, MarketType, OrderSide};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{MmError, MmResult};

/// Tolerance on `sum(order_ratios) == 1`.
pub const RATIO_SUM_EPSILON: Decimal = dec!(0.0001);

/// Upper bound on tiers per side (tier indices fit the client tag).
pub const MAX_TIERS: usize = 10;

/// Ladder market making configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Spot (coin-ratio inventory) or perp (signed position inventory).
    #[serde(default)]
    pub market_type: MarketType,

    /// Total USD notional per side per cycle, split across tiers by `order_ratios`.
    #[serde(default = "default_order_size_usd")]
    pub order_size_usd: Decimal,

    /// Seconds between reconciliation cycles.
    #[serde(default = "default_check_interval_s")]
    pub check_interval_s: u64,

    /// Cap on live + pending orders per side (foreign orders included).
    #[serde(default = "default_max_open_orders_per_side")]
    pub max_open_orders_per_side: usize,

    /// Orders older than this are cancelled unconditionally.
    #[serde(default = "default_order_expiry_minutes")]
    pub order_expiry_minutes: u64,

    /// Maximum directional exposure in USD (held position plus this side's ladder).
    #[serde(default = "default_max_position_usd")]
    pub max_position_usd: Decimal,

    /// Base bid spreads per tier, as fractions of mid (0.001 = 0.1%).
    #[serde(default = "default_spreads")]
    pub buy_spreads: Vec<Decimal>,

    /// Base ask spreads per tier.
    #[serde(default = "default_spreads")]
    pub sell_spreads: Vec<Decimal>,

    /// Share of `order_size_usd` per tier. Must sum to 1.
    #[serde(default = "default_order_ratios")]
    pub order_ratios: Vec<Decimal>,

    /// Spot only: below this coin ratio no sells are quoted.
    #[serde(default = "default_min_sell_ratio")]
    pub min_sell_ratio: Decimal,

    /// Spot only: at or above this coin ratio no buys are quoted.
    #[serde(default = "default_max_coin_ratio")]
    pub max_coin_ratio: Decimal,

    /// Spot only: coin ratio at which the ladder is symmetric.
    #[serde(default = "default_target_coin_ratio")]
    pub target_coin_ratio: Decimal,

    /// Skew per unit of inventory deviation.
    /// When long, bid spreads widen and ask spreads tighten.
    #[serde(default = "default_inventory_skew_multiplier")]
    pub inventory_skew_multiplier: Decimal,

    /// Absolute bound on the skew factor.
    #[serde(default = "default_max_skew")]
    pub max_skew: Decimal,

    /// Candle interval for ATR.
    #[serde(default)]
    pub atr_interval: CandleInterval,

    /// ATR smoothing period in bars.
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Extra bars fetched beyond `atr_period + 1` to warm up the smoothing.
    #[serde(default = "default_atr_warmup_bars")]
    pub atr_warmup_bars: usize,

    /// ATR/mid ratio that maps to a 1.0x volatility multiplier.
    #[serde(default = "default_base_spread")]
    pub base_spread: Decimal,

    #[serde(default = "default_vol_multiplier_min")]
    pub vol_multiplier_min: Decimal,

    #[serde(default = "default_vol_multiplier_max")]
    pub vol_multiplier_max: Decimal,

    /// Price tick; bids round down, asks round up. None = no rounding.
    #[serde(default)]
    pub tick_size: Option<Decimal>,

    /// Base size decimals used when converting USD notional to coin size.
    #[serde(default = "default_size_decimals")]
    pub size_decimals: u32,

    /// Tiers whose size ends up below this notional are dropped.
    #[serde(default)]
    pub min_order_usd: Decimal,

    /// Relative notional difference beyond which a live order no longer
    /// counts as matching its tier.
    #[serde(default = "default_size_tolerance_ratio")]
    pub size_tolerance_ratio: Decimal,

    /// Prefix of client tags issued by this ladder.
    #[serde(default = "default_client_tag_prefix")]
    pub client_tag_prefix: String,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            market_type: MarketType::Spot,
            order_size_usd: default_order_size_usd(),
            check_interval_s: default_check_interval_s(),
            max_open_orders_per_side: default_max_open_orders_per_side(),
            order_expiry_minutes: default_order_expiry_minutes(),
            max_position_usd: default_max_position_usd(),
            buy_spreads: default_spreads(),
            sell_spreads: default_spreads(),
            order_ratios: default_order_ratios(),
            min_sell_ratio: default_min_sell_ratio(),
            max_coin_ratio: default_max_coin_ratio(),
            target_coin_ratio: default_target_coin_ratio(),
            inventory_skew_multiplier: default_inventory_skew_multiplier(),
            max_skew: default_max_skew(),
            atr_interval: CandleInterval::FiveMinutes,
            atr_period: default_atr_period(),
            atr_warmup_bars: default_atr_warmup_bars(),
            base_spread: default_base_spread(),
            vol_multiplier_min: default_vol_multiplier_min(),
            vol_multiplier_max: default_vol_multiplier_max(),
            tick_size: None,
            size_decimals: default_size_decimals(),
            min_order_usd: Decimal::ZERO,
            size_tolerance_ratio: default_size_tolerance_ratio(),
            client_tag_prefix: default_client_tag_prefix(),
        }
    }
}

impl LadderConfig {
    /// Base spreads for one side.
    pub fn spreads(&self, side: OrderSide) -> &[Decimal] {
        match side {
            OrderSide::Buy => &self.buy_spreads,
            OrderSide::Sell => &self.sell_spreads,
        }
    }

    /// Number of tiers per side.
    pub fn tier_count(&self) -> usize {
        self.order_ratios.len()
    }

    /// Candles to request per cycle.
    pub fn candle_fetch_count(&self) -> usize {
        self.atr_period + 1 + self.atr_warmup_bars
    }

    /// Check the run-level invariants. Fatal at startup only.
    pub fn validate(&self) -> MmResult<()> {
        let tiers = self.order_ratios.len();
        if tiers == 0 || tiers > MAX_TIERS {
            return Err(invalid(format!(
                "order_ratios must have 1..={MAX_TIERS} entries, got {tiers}"
            )));
        }
        if self.buy_spreads.len() != tiers || self.sell_spreads.len() != tiers {
            return Err(invalid(format!(
                "buy_spreads ({}) and sell_spreads ({}) must have {tiers} entries like order_ratios",
                self.buy_spreads.len(),
                self.sell_spreads.len()
            )));
        }

        if self.order_ratios.iter().any(|r| *r < Decimal::ZERO) {
            return Err(invalid("order_ratios must be non-negative".to_string()));
        }
        let ratio_sum: Decimal = self.order_ratios.iter().sum();
        if (ratio_sum - Decimal::ONE).abs() > RATIO_SUM_EPSILON {
            return Err(invalid(format!("order_ratios must sum to 1, got {ratio_sum}")));
        }

        for side in OrderSide::ALL {
            let spreads = self.spreads(side);
            if spreads.iter().any(|s| *s <= Decimal::ZERO || *s >= Decimal::ONE) {
                return Err(invalid(format!("{side} spreads must be in (0, 1)")));
            }
            if spreads.windows(2).any(|w| w[1] <= w[0]) {
                return Err(invalid(format!("{side} spreads must be strictly increasing")));
            }
        }

        if self.order_size_usd <= Decimal::ZERO {
            return Err(invalid("order_size_usd must be positive".to_string()));
        }
        if self.max_position_usd <= Decimal::ZERO {
            return Err(invalid("max_position_usd must be positive".to_string()));
        }
        if self.check_interval_s == 0 {
            return Err(invalid("check_interval_s must be positive".to_string()));
        }
        if self.max_open_orders_per_side == 0 {
            return Err(invalid("max_open_orders_per_side must be positive".to_string()));
        }
        if self.order_expiry_minutes == 0 {
            return Err(invalid("order_expiry_minutes must be positive".to_string()));
        }

        let unit = Decimal::ZERO..=Decimal::ONE;
        for (name, value) in [
            ("min_sell_ratio", self.min_sell_ratio),
            ("max_coin_ratio", self.max_coin_ratio),
            ("target_coin_ratio", self.target_coin_ratio),
        ] {
            if !unit.contains(&value) {
                return Err(invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        if self.market_type == MarketType::Spot
            && !(self.min_sell_ratio <= self.target_coin_ratio
                && self.target_coin_ratio <= self.max_coin_ratio)
        {
            return Err(invalid(
                "expected min_sell_ratio <= target_coin_ratio <= max_coin_ratio".to_string(),
            ));
        }

        if self.inventory_skew_multiplier < Decimal::ZERO {
            return Err(invalid("inventory_skew_multiplier must be non-negative".to_string()));
        }
        if self.max_skew < Decimal::ZERO || self.max_skew >= Decimal::ONE {
            return Err(invalid("max_skew must be in [0, 1)".to_string()));
        }

        if self.atr_period == 0 {
            return Err(invalid("atr_period must be positive".to_string()));
        }
        if self.base_spread <= Decimal::ZERO {
            return Err(invalid("base_spread must be positive".to_string()));
        }
        if self.vol_multiplier_min <= Decimal::ZERO {
            return Err(invalid("vol_multiplier_min must be positive".to_string()));
        }
        if self.vol_multiplier_min > self.vol_multiplier_max {
            return Err(invalid(format!(
                "vol_multiplier_min ({}) > vol_multiplier_max ({})",
                self.vol_multiplier_min, self.vol_multiplier_max
            )));
        }

        // Widest possible bid must stay above zero.
        let widest_buy = self.buy_spreads.iter().copied().max().unwrap_or(Decimal::ZERO)
            * self.vol_multiplier_max
            * (Decimal::ONE + self.max_skew);
        if widest_buy >= Decimal::ONE {
            return Err(invalid(format!(
                "widest buy spread {widest_buy} (max spread * vol_multiplier_max * (1 + max_skew)) must be below 1"
            )));
        }

        if matches!(self.tick_size, Some(t) if t <= Decimal::ZERO) {
            return Err(invalid("tick_size must be positive when set".to_string()));
        }
        if self.min_order_usd < Decimal::ZERO {
            return Err(invalid("min_order_usd must be non-negative".to_string()));
        }
        if self.size_tolerance_ratio < Decimal::ZERO {
            return Err(invalid("size_tolerance_ratio must be non-negative".to_string()));
        }
        if self.client_tag_prefix.is_empty() || self.client_tag_prefix.contains('-') {
            return Err(invalid(
                "client_tag_prefix must be non-empty and must not contain '-'".to_string(),
            ));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> MmError {
    MmError::InvalidConfig(msg)
}

fn default_order_size_usd() -> Decimal {
    dec!(500)
}
fn default_check_interval_s() -> u64 {
    60
}
fn default_max_open_orders_per_side() -> usize {
    5
}
fn default_order_expiry_minutes() -> u64 {
    15
}
fn default_max_position_usd() -> Decimal {
    dec!(10000)
}
fn default_spreads() -> Vec<Decimal> {
    vec![dec!(0.001), dec!(0.002), dec!(0.003), dec!(0.004), dec!(0.005)]
}
fn default_order_ratios() -> Vec<Decimal> {
    vec![dec!(0.50), dec!(0.20), dec!(0.10), dec!(0.10), dec!(0.10)]
}
fn default_min_sell_ratio() -> Decimal {
    dec!(0.1)
}
fn default_max_coin_ratio() -> Decimal {
    dec!(0.7)
}
fn default_target_coin_ratio() -> Decimal {
    dec!(0.5)
}
fn default_inventory_skew_multiplier() -> Decimal {
    dec!(1)
}
fn default_max_skew() -> Decimal {
    dec!(0.5)
}
fn default_atr_period() -> usize {
    14
}
fn default_atr_warmup_bars() -> usize {
    4
}
fn default_base_spread() -> Decimal {
    dec!(0.001)
}
fn default_vol_multiplier_min() -> Decimal {
    dec!(0.5)
}
fn default_vol_multiplier_max() -> Decimal {
    dec!(3.0)
}
fn default_size_decimals() -> u32 {
    5
}
fn default_size_tolerance_ratio() -> Decimal {
    dec!(0.25)
}
fn default_client_tag_prefix() -> String {
    "ladder".to_string()
}
