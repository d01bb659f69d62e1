//! Failure handling for delegations.
//!
//! What to do when a child errors is a product decision, not a contract, so
//! it hangs off a trait. The default propagates the error to the caller;
//! retry and reroute strategies are available for parents that want them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use omra_core::Task;

/// What the executor should do after a failed dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureDecision {
    /// Give up and return the error to the caller.
    Propagate,
    /// Dispatch to the same child again after `delay`.
    Retry { delay: Duration },
    /// Exclude the failed child and re-run selection.
    Reroute,
}

/// Strategy consulted once per failed dispatch attempt.
pub trait FailureHandler: Send + Sync {
    fn on_failure(
        &self,
        task: &Task,
        child_id: Uuid,
        attempt: u32,
        error: &anyhow::Error,
    ) -> FailureDecision;
}

/// Default strategy: always hand the error back to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropagateFailure;

impl FailureHandler for PropagateFailure {
    fn on_failure(
        &self,
        _task: &Task,
        _child_id: Uuid,
        _attempt: u32,
        _error: &anyhow::Error,
    ) -> FailureDecision {
        FailureDecision::Propagate
    }
}

/// Retry policy: exponential backoff with optional jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total dispatch attempts allowed, including the first.
    pub max_attempts: u32,
    /// Base delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied per subsequent retry.
    pub backoff_factor: f64,
    /// Delay ceiling in milliseconds.
    pub max_delay_ms: u64,
    /// Add ±25% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-indexed).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let ms = self.base_delay_ms as f64 * self.backoff_factor.powi((retry - 1) as i32);
        let ms = ms.min(self.max_delay_ms as f64) as u64;

        let ms = if self.jitter {
            let jitter = (ms / 4) as i64;
            let offset: i64 = if jitter > 0 {
                (rand_offset() % (jitter as u64 * 2)) as i64 - jitter
            } else {
                0
            };
            (ms as i64 + offset).max(0) as u64
        } else {
            ms
        };

        Duration::from_millis(ms)
    }

    pub fn allows_another_attempt(&self, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts
    }
}

/// xorshift64 for jitter; not worth a rand dependency.
fn rand_offset() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEED: AtomicU64 = AtomicU64::new(0x9e3779b97f4a7c15);
    let x = SEED.load(Ordering::Relaxed);
    let x = x ^ (x << 13);
    let x = x ^ (x >> 7);
    let x = x ^ (x << 17);
    SEED.store(x, Ordering::Relaxed);
    x
}

/// Retry the same child until the policy is exhausted, then propagate.
#[derive(Debug, Clone, Default)]
pub struct RetryHandler {
    pub policy: RetryPolicy,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl FailureHandler for RetryHandler {
    fn on_failure(
        &self,
        task: &Task,
        child_id: Uuid,
        attempt: u32,
        error: &anyhow::Error,
    ) -> FailureDecision {
        if self.policy.allows_another_attempt(attempt) {
            let delay = self.policy.delay_for(attempt);
            warn!(
                task = %task.id,
                child = %child_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Dispatch failed, retrying"
            );
            FailureDecision::Retry { delay }
        } else {
            warn!(task = %task.id, child = %child_id, attempt, "Retry budget exhausted");
            FailureDecision::Propagate
        }
    }
}

/// Try a different child after each failure, up to `max_children` distinct
/// children, then propagate.
#[derive(Debug, Clone)]
pub struct RerouteHandler {
    pub max_children: u32,
}

impl Default for RerouteHandler {
    fn default() -> Self {
        Self { max_children: 3 }
    }
}

impl FailureHandler for RerouteHandler {
    fn on_failure(
        &self,
        task: &Task,
        child_id: Uuid,
        attempt: u32,
        error: &anyhow::Error,
    ) -> FailureDecision {
        if attempt < self.max_children {
            warn!(task = %task.id, child = %child_id, attempt, error = %error, "Dispatch failed, rerouting");
            FailureDecision::Reroute
        } else {
            FailureDecision::Propagate
        }
    }
}
