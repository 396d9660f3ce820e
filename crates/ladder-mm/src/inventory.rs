//! Inventory evaluation and skew.
//!
//! Spot: inventory is the coin share of the account, `coin_usd / (coin_usd + quote)`,
//! measured against `target_coin_ratio`.
//! Perp: inventory is the signed position relative to `max_position_usd`.
//!
//! A positive skew means too much inventory: bids widen, asks tighten.

use ladder_core::{Balances, MarketType, Price};
use rust_decimal::Decimal;

use crate::config::LadderConfig;

/// Balances valued at the current mid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryState {
    pub coin_balance: Decimal,
    pub quote_balance: Decimal,
    pub mid_price: Price,
}

impl InventoryState {
    pub fn new(balances: Balances, mid_price: Price) -> Self {
        Self {
            coin_balance: balances.coin,
            quote_balance: balances.quote,
            mid_price,
        }
    }

    pub fn coin_usd_value(&self) -> Decimal {
        self.coin_balance * self.mid_price.inner()
    }

    pub fn total_value(&self) -> Decimal {
        self.coin_usd_value() + self.quote_balance
    }

    /// Coin share of the account, 0 for an empty account.
    pub fn coin_ratio(&self) -> Decimal {
        let total = self.total_value();
        if total <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.coin_usd_value() / total
    }
}

/// Per-cycle inventory decision consumed by the ladder builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySkew {
    /// Spot: coin share of the account. Perp: position / max position, in [-1, 1].
    pub coin_ratio: Decimal,
    /// Spread adjustment; bids use `1 + skew`, asks `1 - skew`.
    pub skew_factor: Decimal,
    pub buy_allowed: bool,
    pub sell_allowed: bool,
    /// Inventory is above target and asks are being tightened.
    pub sell_boost: bool,
    /// Signed position value in quote currency (spot: coin value, never negative).
    pub position_usd: Decimal,
    /// Spot: quote balance available to fund bids.
    pub buy_capacity_usd: Option<Decimal>,
    /// Spot: coin value available to fill asks.
    pub sell_capacity_usd: Option<Decimal>,
}

impl InventorySkew {
    /// No skew, both sides open, no capacity limits.
    pub fn neutral() -> Self {
        Self {
            coin_ratio: Decimal::ZERO,
            skew_factor: Decimal::ZERO,
            buy_allowed: true,
            sell_allowed: true,
            sell_boost: false,
            position_usd: Decimal::ZERO,
            buy_capacity_usd: None,
            sell_capacity_usd: None,
        }
    }
}

/// Converts balances into an `InventorySkew`. Holds no state between cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryManager;

impl InventoryManager {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, inventory: &InventoryState, config: &LadderConfig) -> InventorySkew {
        match config.market_type {
            MarketType::Spot => Self::evaluate_spot(inventory, config),
            MarketType::Perp => Self::evaluate_perp(inventory, config),
        }
    }

    fn evaluate_spot(inventory: &InventoryState, config: &LadderConfig) -> InventorySkew {
        let coin_ratio = inventory.coin_ratio();
        let skew_factor = clamp_skew(
            (coin_ratio - config.target_coin_ratio) * config.inventory_skew_multiplier,
            config.max_skew,
        );
        let coin_usd = inventory.coin_usd_value().max(Decimal::ZERO);

        InventorySkew {
            coin_ratio,
            skew_factor,
            buy_allowed: coin_ratio < config.max_coin_ratio,
            // Below the floor there is not enough coin to sell.
            sell_allowed: coin_ratio >= config.min_sell_ratio && coin_usd > Decimal::ZERO,
            sell_boost: skew_factor > Decimal::ZERO,
            position_usd: coin_usd,
            buy_capacity_usd: Some(inventory.quote_balance.max(Decimal::ZERO)),
            sell_capacity_usd: Some(coin_usd),
        }
    }

    fn evaluate_perp(inventory: &InventoryState, config: &LadderConfig) -> InventorySkew {
        let position_usd = inventory.coin_usd_value();
        let coin_ratio = if config.max_position_usd > Decimal::ZERO {
            (position_usd / config.max_position_usd).clamp(-Decimal::ONE, Decimal::ONE)
        } else {
            Decimal::ZERO
        };
        let skew_factor = clamp_skew(coin_ratio * config.inventory_skew_multiplier, config.max_skew);

        InventorySkew {
            coin_ratio,
            skew_factor,
            buy_allowed: position_usd < config.max_position_usd,
            sell_allowed: position_usd > -config.max_position_usd,
            sell_boost: skew_factor > Decimal::ZERO,
            position_usd,
            buy_capacity_usd: None,
            sell_capacity_usd: None,
        }
    }
}

fn clamp_skew(raw: Decimal, max_skew: Decimal) -> Decimal {
    raw.clamp(-max_skew, max_skew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spot_state(coin: Decimal, quote: Decimal, mid: Decimal) -> InventoryState {
        InventoryState::new(Balances::new(coin, quote), Price::new(mid))
    }

    #[test]
    fn test_coin_ratio() {
        let s = spot_state(dec!(0.05), dec!(5000), dec!(100000));
        assert_eq!(s.coin_usd_value(), dec!(5000));
        assert_eq!(s.total_value(), dec!(10000));
        assert_eq!(s.coin_ratio(), dec!(0.5));
    }

    #[test]
    fn test_empty_account_ratio_zero() {
        let s = spot_state(Decimal::ZERO, Decimal::ZERO, dec!(100));
        assert_eq!(s.coin_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_at_target_no_skew() {
        let config = LadderConfig::default();
        let skew = InventoryManager::new().evaluate(&spot_state(dec!(50), dec!(5000), dec!(100)), &config);
        assert_eq!(skew.skew_factor, Decimal::ZERO);
        assert!(skew.buy_allowed);
        assert!(skew.sell_allowed);
        assert!(!skew.sell_boost);
    }

    #[test]
    fn test_above_target_positive_skew() {
        let config = LadderConfig::default();
        // ratio 0.6, target 0.5, multiplier 1 -> skew 0.1
        let skew = InventoryManager::new().evaluate(&spot_state(dec!(60), dec!(4000), dec!(100)), &config);
        assert_eq!(skew.coin_ratio, dec!(0.6));
        assert_eq!(skew.skew_factor, dec!(0.1));
        assert!(skew.sell_boost);
        assert_eq!(skew.buy_capacity_usd, Some(dec!(4000)));
        assert_eq!(skew.sell_capacity_usd, Some(dec!(6000)));
    }

    #[test]
    fn test_over_max_coin_ratio_blocks_buys() {
        let config = LadderConfig::default();
        let skew = InventoryManager::new().evaluate(&spot_state(dec!(80), dec!(2000), dec!(100)), &config);
        assert!(!skew.buy_allowed);
        assert!(skew.sell_allowed);
    }

    #[test]
    fn test_below_min_sell_ratio_blocks_sells() {
        let config = LadderConfig::default();
        let skew = InventoryManager::new().evaluate(&spot_state(dec!(5), dec!(9500), dec!(100)), &config);
        assert_eq!(skew.coin_ratio, dec!(0.05));
        assert!(!skew.sell_allowed);
        assert!(skew.buy_allowed);
        assert_eq!(skew.skew_factor, dec!(-0.45));
    }

    #[test]
    fn test_skew_clamped() {
        let config = LadderConfig {
            inventory_skew_multiplier: dec!(4),
            max_skew: dec!(0.5),
            ..Default::default()
        };
        let skew = InventoryManager::new().evaluate(&spot_state(dec!(0), dec!(1000), dec!(100)), &config);
        assert_eq!(skew.skew_factor, dec!(-0.5));
    }

    #[test]
    fn test_perp_long_position() {
        let config = LadderConfig {
            market_type: MarketType::Perp,
            max_position_usd: dec!(10000),
            inventory_skew_multiplier: dec!(0.25),
            ..Default::default()
        };
        let state = spot_state(dec!(0.04), dec!(20000), dec!(100000));
        let skew = InventoryManager::new().evaluate(&state, &config);
        assert_eq!(skew.position_usd, dec!(4000));
        assert_eq!(skew.coin_ratio, dec!(0.4));
        assert_eq!(skew.skew_factor, dec!(0.1));
        assert!(skew.buy_allowed && skew.sell_allowed);
        assert_eq!(skew.buy_capacity_usd, None);
    }

    #[test]
    fn test_perp_at_short_cap_blocks_sells() {
        let config = LadderConfig {
            market_type: MarketType::Perp,
            max_position_usd: dec!(10000),
            ..Default::default()
        };
        let state = spot_state(dec!(-0.1), dec!(20000), dec!(100000));
        let skew = InventoryManager::new().evaluate(&state, &config);
        assert_eq!(skew.coin_ratio, dec!(-1));
        assert!(skew.buy_allowed);
        assert!(!skew.sell_allowed);
        assert_eq!(skew.skew_factor, dec!(-0.5));
    }
}
