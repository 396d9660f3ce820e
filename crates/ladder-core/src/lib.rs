//! Core domain types for the ladder market maker.
//!
//! - `Price`, `Size`: precision-safe numeric types
//! - `OrderSide`, `OrderId`, `ClientTag`: order identity
//! - `Instrument`, `Candle`, `Balances`: market and account inputs
//! - `LiveOrder`, `OrderSpec`, `RejectReason`: order lifecycle

pub mod decimal;
pub mod error;
pub mod execution;
pub mod market;
pub mod order;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use execution::{LiveOrder, OrderSpec, RejectReason};
pub use market::{Balances, Candle, CandleInterval, Instrument, MarketSnapshot, MarketType};
pub use order::{ClientTag, OrderId, OrderSide};
