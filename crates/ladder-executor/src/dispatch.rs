//! Intent dispatch.
//!
//! Cancels go out first, concurrently, and are joined. Placements follow,
//! concurrently, skipping any (side, tier) whose cancel was not confirmed.
//! The whole dispatch shares one deadline; anything unfinished when it
//! passes is reported as deferred and picked up by the next cycle.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use ladder_core::{Instrument, OrderId, OrderSide, OrderSpec};
use ladder_mm::{CancelIntent, ReconcilePlan};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, DynGateway};
use crate::retry::{with_retry, RetryPolicy};

/// How a cancel ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// `NotFound` or `AlreadyFilled`: nothing left resting, counts as resolved.
    AlreadyGone(GatewayError),
    Failed(GatewayError),
    /// Not finished before the deadline.
    Deferred,
}

impl CancelOutcome {
    /// The order is known not to be resting any more.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Cancelled | Self::AlreadyGone(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelResult {
    pub intent: CancelIntent,
    pub outcome: CancelOutcome,
}

/// How a placement ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed(OrderId),
    Failed(GatewayError),
    /// Held back because the cancel for the same tier was not confirmed.
    Guarded,
    /// Not finished (or not started) before the deadline.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceResult {
    pub spec: OrderSpec,
    pub outcome: PlaceOutcome,
}

/// Per-intent results of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub cancels: Vec<CancelResult>,
    pub places: Vec<PlaceResult>,
    pub deadline_hit: bool,
}

impl DispatchReport {
    /// Cancels confirmed or already gone.
    pub fn cancelled(&self) -> usize {
        self.cancels.iter().filter(|c| c.outcome.is_resolved()).count()
    }

    pub fn cancel_failures(&self) -> usize {
        self.cancels
            .iter()
            .filter(|c| matches!(c.outcome, CancelOutcome::Failed(_)))
            .count()
    }

    pub fn placed(&self) -> usize {
        self.places
            .iter()
            .filter(|p| matches!(p.outcome, PlaceOutcome::Placed(_)))
            .count()
    }

    pub fn place_failures(&self) -> usize {
        self.places
            .iter()
            .filter(|p| matches!(p.outcome, PlaceOutcome::Failed(_)))
            .count()
    }

    /// Intents left for the next cycle (deadline or replacement guard).
    pub fn deferred(&self) -> usize {
        let cancels = self
            .cancels
            .iter()
            .filter(|c| c.outcome == CancelOutcome::Deferred)
            .count();
        let places = self
            .places
            .iter()
            .filter(|p| matches!(p.outcome, PlaceOutcome::Deferred | PlaceOutcome::Guarded))
            .count();
        cancels + places
    }
}

/// Sends a `ReconcilePlan` to the gateway.
pub struct IntentDispatcher {
    gateway: DynGateway,
    retry: RetryPolicy,
    deadline: Duration,
}

impl IntentDispatcher {
    pub fn new(gateway: DynGateway, retry: RetryPolicy, deadline: Duration) -> Self {
        Self {
            gateway,
            retry,
            deadline,
        }
    }

    pub async fn execute(&self, instrument: &Instrument, plan: &ReconcilePlan) -> DispatchReport {
        let deadline = Instant::now() + self.deadline;
        let mut report = DispatchReport::default();

        let cancel_futures: Vec<_> = plan
            .to_cancel
            .iter()
            .map(|intent| self.cancel_with_retry(instrument, intent.order_id))
            .collect();
        let (cancel_results, cancel_deadline_hit) = join_until(cancel_futures, deadline).await;

        let mut blocked: HashSet<(OrderSide, u8)> = HashSet::new();
        for (intent, result) in plan.to_cancel.iter().zip(cancel_results) {
            let outcome = match result {
                Some(Ok(())) => {
                    debug!(order_id = %intent.order_id, reason = intent.reason.label(), "Order cancelled");
                    CancelOutcome::Cancelled
                }
                Some(Err(e)) if e.is_order_gone() => {
                    debug!(order_id = %intent.order_id, error = %e, "Order already gone");
                    CancelOutcome::AlreadyGone(e)
                }
                Some(Err(e)) => {
                    warn!(order_id = %intent.order_id, side = %intent.side, error = %e, "Cancel failed");
                    CancelOutcome::Failed(e)
                }
                None => CancelOutcome::Deferred,
            };
            if !outcome.is_resolved() {
                if let Some(tier) = intent.tier_index {
                    blocked.insert((intent.side, tier));
                }
            }
            report.cancels.push(CancelResult {
                intent: intent.clone(),
                outcome,
            });
        }

        let (to_send, guarded): (Vec<&OrderSpec>, Vec<&OrderSpec>) = plan
            .to_place
            .iter()
            .partition(|spec| !blocked.contains(&(spec.side, spec.tier_index)));
        for spec in &guarded {
            debug!(side = %spec.side, tier = spec.tier_index, "Replacement held until cancel confirms");
        }

        let (place_results, place_deadline_hit) = if cancel_deadline_hit {
            (vec![None; to_send.len()], true)
        } else {
            let place_futures: Vec<_> = to_send
                .iter()
                .copied()
                .map(|spec| self.place_with_retry(instrument, spec))
                .collect();
            join_until(place_futures, deadline).await
        };

        for (spec, result) in to_send.into_iter().zip(place_results) {
            let outcome = match result {
                Some(Ok(order_id)) => {
                    debug!(
                        order_id = %order_id,
                        side = %spec.side,
                        tier = spec.tier_index,
                        price = %spec.price,
                        size_usd = %spec.size_usd,
                        "Order placed"
                    );
                    PlaceOutcome::Placed(order_id)
                }
                Some(Err(e)) => {
                    warn!(side = %spec.side, tier = spec.tier_index, error = %e, "Place failed");
                    PlaceOutcome::Failed(e)
                }
                None => PlaceOutcome::Deferred,
            };
            report.places.push(PlaceResult {
                spec: spec.clone(),
                outcome,
            });
        }
        for spec in guarded {
            report.places.push(PlaceResult {
                spec: spec.clone(),
                outcome: PlaceOutcome::Guarded,
            });
        }

        report.deadline_hit = cancel_deadline_hit || place_deadline_hit;
        if report.deadline_hit {
            warn!(deferred = report.deferred(), "Dispatch deadline reached");
        }
        report
    }

    fn cancel_with_retry<'a>(
        &'a self,
        instrument: &'a Instrument,
        order_id: OrderId,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(with_retry(&self.retry, "cancel_order", move || {
            self.gateway.cancel_order(instrument, order_id)
        }))
    }

    fn place_with_retry<'a>(
        &'a self,
        instrument: &'a Instrument,
        spec: &'a OrderSpec,
    ) -> BoxFuture<'a, GatewayResult<OrderId>> {
        Box::pin(with_retry(&self.retry, "place_order", move || {
            self.gateway.place_order(instrument, spec)
        }))
    }
}

/// Drive `futures` concurrently until all finish or `deadline` passes.
/// Unfinished futures are dropped and yield `None`.
async fn join_until<T>(futures: Vec<BoxFuture<'_, T>>, deadline: Instant) -> (Vec<Option<T>>, bool) {
    let mut results: Vec<Option<T>> = futures.iter().map(|_| None).collect();
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(i, fut)| async move { (i, fut.await) })
        .collect();

    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    while !pending.is_empty() {
        tokio::select! {
            Some((i, value)) = pending.next() => results[i] = Some(value),
            () = &mut sleep => return (results, true),
        }
    }
    (results, false)
}
