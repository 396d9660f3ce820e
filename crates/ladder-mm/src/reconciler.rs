//! Desired-vs-live order reconciliation.
//!
//! Per side, independently:
//! 1. Managed orders older than the expiry are cancelled unconditionally.
//! 2. Fresh managed orders are matched greedily to the closest unmatched
//!    tier within that tier's tolerance band (half the gap to the nearest
//!    neighbouring tier) and within the size tolerance.
//! 3. Unmatched tiers are placed innermost first while the side stays under
//!    `max_open_orders_per_side`, counting matched and foreign orders.
//! 4. Unmatched fresh managed orders are cancelled.
//!
//! Orders without this ladder's tag prefix are foreign: never cancelled,
//! but they occupy the order-count cap.

use chrono::{DateTime, Duration, Utc};
use ladder_core::{ClientTag, LiveOrder, OrderId, OrderSide, OrderSpec, Price};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::config::LadderConfig;
use crate::ladder::{LadderIntent, LadderTier};

/// Why an order is being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// Older than the expiry threshold.
    Stale,
    /// No desired tier within tolerance.
    Unmatched,
}

impl CancelReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stale => "stale",
            Self::Unmatched => "unmatched",
        }
    }
}

/// A cancellation the gateway should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelIntent {
    pub order_id: OrderId,
    pub side: OrderSide,
    /// Tier recovered from the order's client tag.
    pub tier_index: Option<u8>,
    pub reason: CancelReason,
}

/// Output of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_cancel: Vec<CancelIntent>,
    pub to_place: Vec<OrderSpec>,
    /// Live orders left standing because they match a desired tier.
    pub kept: Vec<OrderId>,
    /// Desired tiers not placed because the side was at its order cap.
    pub skipped_over_cap: usize,
}

impl ReconcilePlan {
    /// Nothing to send to the venue.
    pub fn is_empty(&self) -> bool {
        self.to_cancel.is_empty() && self.to_place.is_empty()
    }

    pub fn cancel_ids(&self) -> Vec<OrderId> {
        self.to_cancel.iter().map(|c| c.order_id).collect()
    }

    fn merge(&mut self, other: ReconcilePlan) {
        self.to_cancel.extend(other.to_cancel);
        self.to_place.extend(other.to_place);
        self.kept.extend(other.kept);
        self.skipped_over_cap += other.skipped_over_cap;
    }
}

/// Stateless diff between a `LadderIntent` and the venue's open orders.
#[derive(Debug, Clone)]
pub struct OrderReconciler {
    tag_prefix: String,
    expiry: Duration,
    max_open_per_side: usize,
    size_tolerance_ratio: Decimal,
}

impl OrderReconciler {
    pub fn new(config: &LadderConfig) -> Self {
        Self {
            tag_prefix: config.client_tag_prefix.clone(),
            expiry: Duration::minutes(config.order_expiry_minutes as i64),
            max_open_per_side: config.max_open_orders_per_side,
            size_tolerance_ratio: config.size_tolerance_ratio,
        }
    }

    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    /// Diff `desired` against `live` at time `now`.
    pub fn reconcile(
        &self,
        desired: &LadderIntent,
        live: &[LiveOrder],
        now: DateTime<Utc>,
    ) -> ReconcilePlan {
        let mut plan = ReconcilePlan::default();
        for side in OrderSide::ALL {
            let side_live: Vec<&LiveOrder> = live.iter().filter(|o| o.side == side).collect();
            plan.merge(self.reconcile_side(
                side,
                desired.side(side),
                desired.mid_price,
                &side_live,
                now,
            ));
        }
        plan
    }

    fn reconcile_side(
        &self,
        side: OrderSide,
        tiers: &[LadderTier],
        mid_price: Price,
        live: &[&LiveOrder],
        now: DateTime<Utc>,
    ) -> ReconcilePlan {
        let mut plan = ReconcilePlan::default();

        let (managed, foreign): (Vec<&LiveOrder>, Vec<&LiveOrder>) = live
            .iter()
            .copied()
            .partition(|o| o.is_managed_by(&self.tag_prefix));

        let mut fresh = Vec::with_capacity(managed.len());
        for order in managed {
            if order.age(now) > self.expiry {
                debug!(
                    order_id = %order.order_id,
                    side = %side,
                    age_s = order.age(now).num_seconds(),
                    "Order stale"
                );
                plan.to_cancel.push(self.cancel_intent(order, CancelReason::Stale));
            } else {
                fresh.push(order);
            }
        }

        let tolerances = tier_tolerances(tiers, mid_price);
        let mut candidates: Vec<(Decimal, u8, OrderId, usize, usize)> = Vec::new();
        for (oi, order) in fresh.iter().enumerate() {
            for (ti, tier) in tiers.iter().enumerate() {
                let distance = order.price.distance(tier.price);
                if distance <= tolerances[ti] && self.size_matches(order, tier) {
                    candidates.push((distance, tier.tier_index, order.order_id, oi, ti));
                }
            }
        }
        candidates.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        let mut order_matched = vec![false; fresh.len()];
        let mut tier_matched = vec![false; tiers.len()];
        for (_, _, order_id, oi, ti) in candidates {
            if order_matched[oi] || tier_matched[ti] {
                continue;
            }
            order_matched[oi] = true;
            tier_matched[ti] = true;
            plan.kept.push(order_id);
        }

        for (order, matched) in fresh.iter().zip(&order_matched) {
            if !matched {
                plan.to_cancel.push(self.cancel_intent(order, CancelReason::Unmatched));
            }
        }

        let occupied = plan.kept.len() + foreign.len();
        let mut open_slots = self.max_open_per_side.saturating_sub(occupied);
        for (tier, matched) in tiers.iter().zip(&tier_matched) {
            if *matched {
                continue;
            }
            if open_slots == 0 {
                plan.skipped_over_cap += 1;
                continue;
            }
            open_slots -= 1;
            plan.to_place.push(OrderSpec {
                side,
                price: tier.price,
                size_usd: tier.size_usd,
                tier_index: tier.tier_index,
                client_tag: ClientTag::new(&self.tag_prefix, side, tier.tier_index),
            });
        }

        if plan.skipped_over_cap > 0 {
            debug!(
                side = %side,
                skipped = plan.skipped_over_cap,
                foreign = foreign.len(),
                cap = self.max_open_per_side,
                "Order cap reached, outer tiers skipped"
            );
        }

        plan
    }

    fn size_matches(&self, order: &LiveOrder, tier: &LadderTier) -> bool {
        let allowed = tier.size_usd * self.size_tolerance_ratio;
        (order.size_usd() - tier.size_usd).abs() <= allowed
    }

    fn cancel_intent(&self, order: &LiveOrder, reason: CancelReason) -> CancelIntent {
        CancelIntent {
            order_id: order.order_id,
            side: order.side,
            tier_index: order.ladder_slot(&self.tag_prefix).map(|(_, tier)| tier),
            reason,
        }
    }
}

/// Half the gap to the nearest neighbouring tier; a lone tier gets half its
/// distance from mid.
fn tier_tolerances(tiers: &[LadderTier], mid_price: Price) -> Vec<Decimal> {
    let half = dec!(0.5);
    if tiers.len() == 1 {
        return vec![tiers[0].price.distance(mid_price) * half];
    }
    (0..tiers.len())
        .map(|i| {
            let prev = i.checked_sub(1).map(|p| tiers[i].price.distance(tiers[p].price));
            let next = tiers.get(i + 1).map(|n| tiers[i].price.distance(n.price));
            let gap = match (prev, next) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => Decimal::ZERO,
            };
            gap * half
        })
        .collect()
}
