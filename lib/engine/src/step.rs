//! Retriable step execution for node side effects.
//!
//! The engine depends on a small durable-execution capability: run a named
//! side effect, retry transient failures with backoff, and hand downstream
//! nodes only the output of the eventually successful attempt. Configuration
//! errors are never retried, since the payload cannot change a workflow's
//! static configuration.

use crate::error::ExecutorError;
use std::future::Future;
use std::time::Duration;

/// Retry budget and backoff for a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff delay before retrying after `attempt` failures.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Runs named side effects under a retry policy.
#[derive(Debug, Clone, Default)]
pub struct StepRunner {
    policy: RetryPolicy,
}

impl StepRunner {
    /// Creates a step runner with the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `op`, retrying retriable failures until the budget is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first non-retriable error immediately, or the last
    /// retriable error once the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, name: &str, op: F) -> Result<T, ExecutorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ExecutorError>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retriable() => return Err(error),
                Err(error) if attempt >= self.policy.max_attempts => {
                    tracing::warn!(
                        step = name,
                        attempts = attempt,
                        error = %error,
                        "step exhausted its retry budget"
                    );
                    return Err(error);
                }
                Err(error) => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        step = name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying step"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
