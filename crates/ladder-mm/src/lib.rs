//! Tiered ladder quoting engine.
//!
//! Pure, synchronous decision logic for one reconciliation cycle:
//! - Volatility multiplier from candle ATR
//! - Inventory skew from balances
//! - Ladder tiers per side (price, size) under capacity and position caps
//! - Diff of the desired ladder against live orders
//!
//! # Architecture
//!
//! ```text
//! candles ──► VolatilityEstimator ──┐
//!                                   ├──► build_ladder ──► OrderReconciler ──► ReconcilePlan
//! balances ─► InventoryManager ─────┘                          ▲
//!                                                   live orders┘
//! ```

pub mod config;
pub mod error;
pub mod inventory;
pub mod ladder;
pub mod reconciler;
pub mod volatility;

pub use config::LadderConfig;
pub use error::{MmError, MmResult};
pub use inventory::{InventoryManager, InventorySkew, InventoryState};
pub use ladder::{build_ladder, build_side, LadderIntent, LadderTier, MIN_EFFECTIVE_SPREAD};
pub use reconciler::{CancelIntent, CancelReason, OrderReconciler, ReconcilePlan};
pub use volatility::{VolatilityEstimator, VolatilityReading};
