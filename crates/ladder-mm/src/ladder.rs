//! Ladder construction.
//!
//! Each side is built independently from:
//! - Mid price
//! - Base spreads for the side, scaled by the volatility multiplier
//! - Inventory skew (bids `* (1 + skew)`, asks `* (1 - skew)`)
//! - Size ratios, capacity limits and the position cap

use ladder_core::{OrderSide, Price};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::LadderConfig;
use crate::inventory::InventorySkew;

/// Effective spreads never go below one basis point.
pub const MIN_EFFECTIVE_SPREAD: Decimal = dec!(0.0001);

/// Decimal places kept on tier notionals.
const USD_SCALE: u32 = 8;

/// One rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderTier {
    pub side: OrderSide,
    /// 0 = innermost (tightest spread).
    pub tier_index: u8,
    /// Effective spread after volatility and skew.
    pub spread: Decimal,
    pub price: Price,
    /// Target notional in quote currency.
    pub size_usd: Decimal,
}

/// Desired order set for one cycle. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderIntent {
    pub mid_price: Price,
    /// Innermost first, prices descending.
    pub bids: Vec<LadderTier>,
    /// Innermost first, prices ascending.
    pub asks: Vec<LadderTier>,
}

impl LadderIntent {
    pub fn side(&self, side: OrderSide) -> &[LadderTier] {
        match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        }
    }

    /// Sum of target notionals on one side.
    pub fn total_notional(&self, side: OrderSide) -> Decimal {
        self.side(side).iter().map(|t| t.size_usd).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Build both sides of the ladder.
///
/// # Arguments
/// * `mid_price` - Current mid price
/// * `vol_multiplier` - Spread multiplier from the volatility estimator (1.0 = base spreads)
/// * `skew` - Inventory decision for this cycle
/// * `config` - Ladder configuration
pub fn build_ladder(
    mid_price: Price,
    vol_multiplier: Decimal,
    skew: &InventorySkew,
    config: &LadderConfig,
) -> LadderIntent {
    LadderIntent {
        mid_price,
        bids: build_side(OrderSide::Buy, mid_price, vol_multiplier, skew, config),
        asks: build_side(OrderSide::Sell, mid_price, vol_multiplier, skew, config),
    }
}

/// Build one side of the ladder. Returns tiers innermost first; tiers sized
/// to zero or below `min_order_usd` are omitted.
pub fn build_side(
    side: OrderSide,
    mid_price: Price,
    vol_multiplier: Decimal,
    skew: &InventorySkew,
    config: &LadderConfig,
) -> Vec<LadderTier> {
    let allowed = match side {
        OrderSide::Buy => skew.buy_allowed,
        OrderSide::Sell => skew.sell_allowed,
    };
    if !allowed || !mid_price.is_positive() {
        return Vec::new();
    }

    let skew_term = match side {
        OrderSide::Buy => Decimal::ONE + skew.skew_factor,
        OrderSide::Sell => Decimal::ONE - skew.skew_factor,
    };

    let mut sizes = tier_sizes(config);

    let capacity = match side {
        OrderSide::Buy => skew.buy_capacity_usd,
        OrderSide::Sell => skew.sell_capacity_usd,
    };
    if let Some(capacity) = capacity {
        scale_to_capacity(&mut sizes, capacity.max(Decimal::ZERO));
    }

    let directional_position = match side {
        OrderSide::Buy => skew.position_usd,
        OrderSide::Sell => -skew.position_usd,
    };
    let headroom = (config.max_position_usd - directional_position).max(Decimal::ZERO);
    trim_outermost(&mut sizes, headroom);

    let tick = config.tick_size.unwrap_or(Decimal::ZERO);
    let mid = mid_price.inner();

    config
        .spreads(side)
        .iter()
        .zip(sizes)
        .enumerate()
        .filter(|(_, (_, size))| *size > Decimal::ZERO && *size >= config.min_order_usd)
        .map(|(i, (base, size_usd))| {
            let spread = (*base * vol_multiplier * skew_term).max(MIN_EFFECTIVE_SPREAD);
            let price = match side {
                OrderSide::Buy => Price::new(mid * (Decimal::ONE - spread)).floor_to_tick(tick),
                OrderSide::Sell => Price::new(mid * (Decimal::ONE + spread)).ceil_to_tick(tick),
            };
            LadderTier {
                side,
                tier_index: i as u8,
                spread,
                price,
                size_usd,
            }
        })
        .filter(|tier| tier.price.is_positive())
        .collect()
}

/// `order_size_usd * ratio` per tier. Ratios summing slightly above one are
/// normalized so a side never allocates more than `order_size_usd`.
/// Truncation keeps the rounded sum from creeping above the total.
fn tier_sizes(config: &LadderConfig) -> Vec<Decimal> {
    let ratio_sum: Decimal = config.order_ratios.iter().sum();
    let divisor = ratio_sum.max(Decimal::ONE);
    config
        .order_ratios
        .iter()
        .map(|r| (config.order_size_usd * *r / divisor).trunc_with_scale(USD_SCALE))
        .collect()
}

/// Scale every tier by `capacity / total` when the side asks for more than `capacity`.
fn scale_to_capacity(sizes: &mut [Decimal], capacity: Decimal) {
    let total: Decimal = sizes.iter().sum();
    if total <= capacity || total.is_zero() {
        return;
    }
    let factor = capacity / total;
    for size in sizes.iter_mut() {
        *size = (*size * factor).trunc_with_scale(USD_SCALE);
    }
}

/// Remove notional from the outermost tier inward until the side totals at most `limit`.
fn trim_outermost(sizes: &mut [Decimal], limit: Decimal) {
    let mut excess = sizes.iter().sum::<Decimal>() - limit;
    for size in sizes.iter_mut().rev() {
        if excess <= Decimal::ZERO {
            break;
        }
        let cut = excess.min(*size);
        *size -= cut;
        excess -= cut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_core::MarketType;

    fn config_300() -> LadderConfig {
        LadderConfig {
            order_size_usd: dec!(300),
            ..Default::default()
        }
    }

    fn prices(tiers: &[LadderTier]) -> Vec<Decimal> {
        tiers.iter().map(|t| t.price.inner()).collect()
    }

    fn sizes(tiers: &[LadderTier]) -> Vec<Decimal> {
        tiers.iter().map(|t| t.size_usd).collect()
    }

    #[test]
    fn test_reference_buy_ladder() {
        let mid = Price::new(dec!(100000));
        let bids = build_side(OrderSide::Buy, mid, dec!(1), &InventorySkew::neutral(), &config_300());

        assert_eq!(
            prices(&bids),
            vec![dec!(99900), dec!(99800), dec!(99700), dec!(99600), dec!(99500)]
        );
        assert_eq!(sizes(&bids), vec![dec!(150), dec!(60), dec!(30), dec!(30), dec!(30)]);
        assert_eq!(bids.iter().map(|t| t.tier_index).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_double_vol_widens_not_resizes() {
        let mid = Price::new(dec!(100000));
        let bids = build_side(OrderSide::Buy, mid, dec!(2.0), &InventorySkew::neutral(), &config_300());

        assert_eq!(bids[0].price.inner(), dec!(99800));
        assert_eq!(sizes(&bids), vec![dec!(150), dec!(60), dec!(30), dec!(30), dec!(30)]);
    }

    #[test]
    fn test_zero_skew_symmetric() {
        let mid = Price::new(dec!(100000));
        let ladder = build_ladder(mid, dec!(1), &InventorySkew::neutral(), &config_300());

        for (bid, ask) in ladder.bids.iter().zip(&ladder.asks) {
            assert_eq!(mid.inner() - bid.price.inner(), ask.price.inner() - mid.inner());
            assert_eq!(bid.size_usd, ask.size_usd);
        }
    }

    #[test]
    fn test_positive_skew_widens_bids_tightens_asks() {
        let mid = Price::new(dec!(100000));
        let skew = InventorySkew {
            skew_factor: dec!(0.2),
            ..InventorySkew::neutral()
        };
        let ladder = build_ladder(mid, dec!(1), &skew, &config_300());

        assert_eq!(ladder.bids[0].spread, dec!(0.0012));
        assert_eq!(ladder.asks[0].spread, dec!(0.0008));
        assert_eq!(ladder.bids[0].price.inner(), dec!(99880));
        assert_eq!(ladder.asks[0].price.inner(), dec!(100080));
    }

    #[test]
    fn test_spread_floor() {
        let mid = Price::new(dec!(100000));
        let config = LadderConfig {
            max_skew: dec!(0.99),
            ..config_300()
        };
        let skew = InventorySkew {
            skew_factor: dec!(0.99),
            ..InventorySkew::neutral()
        };
        let asks = build_side(OrderSide::Sell, mid, dec!(0.5), &skew, &config);
        assert_eq!(asks[0].spread, MIN_EFFECTIVE_SPREAD);
        assert_eq!(asks[0].price.inner(), dec!(100010));
    }

    #[test]
    fn test_bids_past_mid_are_dropped() {
        let mid = Price::new(dec!(100));
        let config = LadderConfig {
            buy_spreads: vec![dec!(0.1), dec!(0.2), dec!(0.3), dec!(0.4), dec!(0.5)],
            ..config_300()
        };
        let skew = InventorySkew {
            skew_factor: dec!(0.5),
            ..InventorySkew::neutral()
        };
        let bids = build_side(OrderSide::Buy, mid, dec!(3), &skew, &config);

        // Effective spreads 0.45 and 0.9 survive; 1.35 and up would price at or below zero.
        assert_eq!(prices(&bids), vec![dec!(55), dec!(10)]);
        assert_eq!(bids.iter().map(|t| t.tier_index).collect::<Vec<_>>(), vec![0, 1]);
        assert!(bids.iter().all(|t| t.price.is_positive()));
    }

    #[test]
    fn test_buy_blocked_yields_no_bids() {
        let skew = InventorySkew {
            buy_allowed: false,
            ..InventorySkew::neutral()
        };
        let ladder = build_ladder(Price::new(dec!(100)), dec!(1), &skew, &config_300());
        assert!(ladder.bids.is_empty());
        assert_eq!(ladder.asks.len(), 5);
    }

    #[test]
    fn test_sell_capacity_scales_proportionally() {
        let skew = InventorySkew {
            sell_capacity_usd: Some(dec!(150)),
            ..InventorySkew::neutral()
        };
        let asks = build_side(OrderSide::Sell, Price::new(dec!(100)), dec!(1), &skew, &config_300());
        assert_eq!(sizes(&asks), vec![dec!(75), dec!(30), dec!(15), dec!(15), dec!(15)]);
        assert_eq!(asks.iter().map(|t| t.size_usd).sum::<Decimal>(), dec!(150));
    }

    #[test]
    fn test_buy_capacity_limits_to_quote_balance() {
        let skew = InventorySkew {
            buy_capacity_usd: Some(dec!(30)),
            ..InventorySkew::neutral()
        };
        let bids = build_side(OrderSide::Buy, Price::new(dec!(100)), dec!(1), &skew, &config_300());
        assert_eq!(bids.iter().map(|t| t.size_usd).sum::<Decimal>(), dec!(30));
    }

    #[test]
    fn test_position_cap_trims_outermost_first() {
        let config = LadderConfig {
            max_position_usd: dec!(1000),
            ..config_300()
        };
        // 800 held long, 200 of headroom for bids.
        let skew = InventorySkew {
            position_usd: dec!(800),
            ..InventorySkew::neutral()
        };
        let bids = build_side(OrderSide::Buy, Price::new(dec!(100)), dec!(1), &skew, &config);
        assert_eq!(sizes(&bids), vec![dec!(150), dec!(50)]);
        assert_eq!(bids.iter().map(|t| t.tier_index).collect::<Vec<_>>(), vec![0, 1]);

        // Sells reduce the long, so they are not capped.
        let asks = build_side(OrderSide::Sell, Price::new(dec!(100)), dec!(1), &skew, &config);
        assert_eq!(asks.len(), 5);
    }

    #[test]
    fn test_min_order_usd_drops_small_tiers() {
        let config = LadderConfig {
            min_order_usd: dec!(50),
            ..config_300()
        };
        let bids = build_side(OrderSide::Buy, Price::new(dec!(100)), dec!(1), &InventorySkew::neutral(), &config);
        assert_eq!(sizes(&bids), vec![dec!(150), dec!(60)]);
    }

    #[test]
    fn test_tick_rounding_away_from_mid() {
        let config = LadderConfig {
            tick_size: Some(dec!(0.5)),
            ..config_300()
        };
        let mid = Price::new(dec!(1234.3));
        let ladder = build_ladder(mid, dec!(1), &InventorySkew::neutral(), &config);
        // 1234.3 * 0.999 = 1233.0657 -> 1233.0; 1234.3 * 1.001 = 1235.5343 -> 1236.0
        assert_eq!(ladder.bids[0].price.inner(), dec!(1233.0));
        assert_eq!(ladder.asks[0].price.inner(), dec!(1236.0));
    }

    #[test]
    fn test_never_exceeds_order_size() {
        let config = LadderConfig {
            order_ratios: vec![dec!(0.5), dec!(0.2), dec!(0.1), dec!(0.1), dec!(0.10005)],
            ..config_300()
        };
        let ladder = build_ladder(Price::new(dec!(100)), dec!(1), &InventorySkew::neutral(), &config);
        assert!(ladder.total_notional(OrderSide::Buy) <= dec!(300));
        assert!(ladder.total_notional(OrderSide::Sell) <= dec!(300));
    }

    #[test]
    fn test_deterministic() {
        let config = LadderConfig {
            market_type: MarketType::Perp,
            ..config_300()
        };
        let skew = InventorySkew {
            skew_factor: dec!(-0.13),
            position_usd: dec!(-250),
            ..InventorySkew::neutral()
        };
        let a = build_ladder(Price::new(dec!(3120.7)), dec!(1.37), &skew, &config);
        let b = build_ladder(Price::new(dec!(3120.7)), dec!(1.37), &skew, &config);
        assert_eq!(a, b);
    }
}
