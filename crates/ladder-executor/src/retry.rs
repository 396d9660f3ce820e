//! Bounded retry with per-call timeout and exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};

/// Retry settings for a single gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Each attempt is abandoned after this long and counts as `Timeout`.
    pub call_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            call_timeout: Duration::from_secs(10),
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Sleep before `attempt` (1-based): none before the first,
    /// then `base * 2^(attempt-2)` capped at `backoff_max`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(16);
        let base_ms = self.backoff_base.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay_ms).min(self.backoff_max)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// Only transient errors (see `GatewayError::is_transient`) are retried.
/// The last error is returned after exhaustion.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op_name: &'static str, mut op: F) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(policy.call_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(policy.call_timeout)),
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    debug!(op = op_name, attempt, "Call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                attempt += 1;
                let delay = policy.delay_before(attempt);
                warn!(
                    op = op_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient gateway error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
