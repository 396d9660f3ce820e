//! Prometheus metrics and structured logging for the ladder market maker.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for cycles, orders, volatility and inventory
//! - `GET /metrics` exporter

pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use server::{bind_metrics, serve_listener, serve_metrics};
