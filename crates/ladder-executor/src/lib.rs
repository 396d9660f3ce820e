//! Async execution side of the ladder market maker.
//!
//! - `ExchangeGateway`: the only path to the venue (reads and order RPCs)
//! - `with_retry`: bounded retries for transient gateway failures
//! - `IntentDispatcher`: cancels, then places, under a cycle deadline
//! - `StrategyLoop`: one reconciliation cycle per tick

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod retry;
pub mod strategy_loop;

pub use config::ExecutorConfig;
pub use dispatch::{
    CancelOutcome, CancelResult, DispatchReport, IntentDispatcher, PlaceOutcome, PlaceResult,
};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{
    BoxFuture, DynGateway, ExchangeGateway, GatewayCall, MockGateway, RecordedCall,
};
pub use retry::{with_retry, RetryPolicy};
pub use strategy_loop::{
    CycleOutcome, CycleReport, FetchStage, LoopState, SkipReason, StrategyLoop,
};
