//! Main application orchestration.
//!
//! Coordinates:
//! - Venue gateway (observation mode)
//! - Strategy loop, one reconciliation cycle per tick
//! - Per-cycle metrics and the `/metrics` exporter
//! - Ctrl-C shutdown

use std::sync::Arc;

use ladder_core::{Instrument, OrderSide};
use ladder_executor::{
    CancelOutcome, CycleOutcome, CycleReport, DynGateway, PlaceOutcome, RetryPolicy, StrategyLoop,
};
use ladder_telemetry::Metrics;
use ladder_venue::{InfoClient, PaperGateway};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    instrument: Instrument,
    gateway: DynGateway,
}

impl Application {
    /// Build the application against the observation-mode venue gateway.
    /// Validation happens in `with_gateway`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = InfoClient::new(config.venue.info_url.clone())?;
        let gateway = PaperGateway::new(
            client,
            config.venue.clone(),
            config.strategy.size_decimals,
        );
        info!(
            info_url = %config.venue.info_url,
            user = config.venue.user_address.as_deref().unwrap_or("paper"),
            "Observation mode: orders are kept in memory and never sent"
        );
        Self::with_gateway(config, Arc::new(gateway))
    }

    /// Build the application against any gateway.
    pub fn with_gateway(config: AppConfig, gateway: DynGateway) -> AppResult<Self> {
        config.validate()?;
        let instrument = config.instrument();
        Ok(Self {
            config,
            instrument,
            gateway,
        })
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            signal_token.cancel();
        });

        self.run_until(shutdown).await
    }

    /// Run until `shutdown` fires. The in-flight cycle always completes;
    /// resting orders are left on the book.
    pub async fn run_until(self, shutdown: CancellationToken) -> AppResult<()> {
        let metrics_handle = self.start_metrics_server(&shutdown).await?;

        let mut strategy = StrategyLoop::new(
            self.config.strategy.clone(),
            self.instrument.clone(),
            self.gateway.clone(),
            RetryPolicy::from(&self.config.executor),
            self.config.executor.cycle_deadline(),
        );

        let mut cycles: u64 = 0;
        strategy
            .run(shutdown.clone(), |report| {
                cycles += 1;
                record_cycle(report);
            })
            .await;

        // Stop the exporter even when the loop ended on its own.
        shutdown.cancel();
        if let Some(handle) = metrics_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Metrics server task panicked");
            }
        }

        info!(cycles, instrument = %self.instrument, "Shut down");
        Ok(())
    }

    /// Bind before the loop starts; a taken port is a startup error.
    async fn start_metrics_server(
        &self,
        shutdown: &CancellationToken,
    ) -> AppResult<Option<JoinHandle<()>>> {
        let port = self.config.telemetry.metrics_port;
        if port == 0 {
            return Ok(None);
        }
        let listener = ladder_telemetry::bind_metrics(port).await?;
        let shutdown = shutdown.clone();
        Ok(Some(tokio::spawn(async move {
            if let Err(e) = ladder_telemetry::serve_listener(listener, shutdown).await {
                warn!(error = %e, "Metrics server failed");
            }
        })))
    }
}

/// Push one cycle report into the Prometheus metrics.
pub fn record_cycle(report: &CycleReport) {
    let elapsed = report.elapsed.as_secs_f64();
    match &report.outcome {
        CycleOutcome::Completed => Metrics::cycle_completed(elapsed),
        CycleOutcome::Skipped(reason) => {
            Metrics::cycle_skipped(reason.label(), elapsed);
            return;
        }
    }

    if let Some(mid) = report.mid_price {
        Metrics::mid_price(to_f64(mid.inner()));
    }
    Metrics::vol_multiplier(to_f64(report.vol_multiplier), report.vol_fallback);
    if let Some(skew) = &report.skew {
        Metrics::inventory(to_f64(skew.coin_ratio), to_f64(skew.skew_factor));
    }
    for side in OrderSide::ALL {
        Metrics::live_orders(&side.to_string(), report.live_orders(side));
    }

    for cancel in &report.dispatch.cancels {
        match &cancel.outcome {
            CancelOutcome::Cancelled | CancelOutcome::AlreadyGone(_) => Metrics::order_cancelled(
                &cancel.intent.side.to_string(),
                cancel.intent.reason.label(),
            ),
            CancelOutcome::Failed(e) => Metrics::order_failed("cancel", e.label()),
            CancelOutcome::Deferred => Metrics::order_deferred("cancel"),
        }
    }
    for place in &report.dispatch.places {
        match &place.outcome {
            PlaceOutcome::Placed(_) => Metrics::order_placed(&place.spec.side.to_string()),
            PlaceOutcome::Failed(e) => Metrics::order_failed("place", e.label()),
            PlaceOutcome::Guarded | PlaceOutcome::Deferred => Metrics::order_deferred("place"),
        }
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
