//! Retry executor composed with the circuit breaker.
//!
//! Every upstream call (identity lookups and business-data calls alike) goes
//! through [`Resilience::execute`]. The breaker is consulted before each
//! attempt; the outcome of each attempt is reported back to it.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use identity_resolver_sdk::{BreakerSnapshot, BreakerState};
use tokio::time::Instant;

use super::breaker::CircuitBreaker;
use crate::config::{BreakerConfig, RetryConfig};

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Counts against the breaker; the executor may try again.
    Retryable,
    /// The upstream is throttling. Returned at once, never counted as a failure.
    RateLimited,
    /// The upstream answered and retrying cannot help.
    Permanent,
}

/// Backoff policy: exponential from `base_delay`, capped at `max_delay`,
/// bounded by `max_attempts` and an overall wall-clock `budget`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub budget: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            budget: Duration::from_millis(cfg.budget_ms),
        }
    }

    /// Delay slept after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }
}

/// Outcome of [`Resilience::execute`] when it does not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ResilienceError<E> {
    /// The breaker rejected the call before the upstream was contacted.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The last attempt's error.
    #[error(transparent)]
    Operation(E),
}

/// Retry policy plus the shared circuit breaker.
#[derive(Debug, Clone)]
pub struct Resilience {
    policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl Resilience {
    #[must_use]
    pub fn new(policy: RetryPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        Self { policy, breaker }
    }

    #[must_use]
    pub fn from_config(retry: &RetryConfig, breaker: &BreakerConfig) -> Self {
        Self::new(
            RetryPolicy::from_config(retry),
            Arc::new(CircuitBreaker::from_config(breaker)),
        )
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    #[must_use]
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Run `op` under the retry policy and the circuit breaker.
    ///
    /// `op` receives the 1-based attempt number. `classify` decides what a
    /// failed attempt means. Stops retrying as soon as the breaker opens, the
    /// attempts are used up, or the next backoff would overrun the budget.
    ///
    /// The first attempt is bounded only by the caller's own timeout. Every
    /// retry is cut off at the budget deadline; a retry cut off that way is
    /// not reported to the breaker and the previous attempt's error is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`ResilienceError::CircuitOpen`] if the breaker rejected an attempt
    /// - [`ResilienceError::Operation`] with the last attempt's error otherwise
    pub async fn execute<T, E, F, Fut, C>(
        &self,
        operation: &'static str,
        mut op: F,
        classify: C,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> FailureClass,
        E: Display,
    {
        let deadline = Instant::now() + self.policy.budget;
        let mut attempt: u32 = 0;
        let mut previous: Option<E> = None;

        loop {
            attempt += 1;

            let Some(permit) = self.breaker.try_acquire() else {
                tracing::warn!(
                    operation,
                    attempt,
                    "Upstream call rejected: circuit breaker is open"
                );
                return Err(ResilienceError::CircuitOpen);
            };

            let outcome = match previous.take() {
                None => op(attempt).await,
                Some(previous) => {
                    let Ok(outcome) = tokio::time::timeout_at(deadline, op(attempt)).await else {
                        drop(permit);
                        tracing::warn!(
                            operation,
                            attempts = attempt,
                            error = %previous,
                            "Upstream retry cut off at the budget deadline"
                        );
                        return Err(ResilienceError::Operation(previous));
                    };
                    outcome
                }
            };

            let err = match outcome {
                Ok(value) => {
                    permit.record_success();
                    if attempt > 1 {
                        tracing::info!(
                            operation,
                            attempt,
                            "Upstream call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            match classify(&err) {
                FailureClass::Permanent => {
                    permit.record_success();
                    tracing::debug!(
                        operation,
                        attempt,
                        error = %err,
                        "Upstream call failed permanently"
                    );
                    return Err(ResilienceError::Operation(err));
                }
                FailureClass::RateLimited => {
                    permit.record_rate_limited();
                    tracing::warn!(
                        operation,
                        attempt,
                        "Upstream call rate limited; not retrying"
                    );
                    return Err(ResilienceError::Operation(err));
                }
                FailureClass::Retryable => {
                    if permit.record_failure() == BreakerState::Open {
                        tracing::warn!(
                            operation,
                            attempt,
                            error = %err,
                            "Upstream call failed and circuit breaker is open; not retrying"
                        );
                        return Err(ResilienceError::Operation(err));
                    }
                }
            }

            if attempt >= self.policy.max_attempts {
                tracing::warn!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "Upstream call failed; retries exhausted"
                );
                return Err(ResilienceError::Operation(err));
            }

            let delay = self.policy.delay_after(attempt);
            if Instant::now() + delay > deadline {
                tracing::warn!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "Upstream call failed; retry budget exhausted"
                );
                return Err(ResilienceError::Operation(err));
            }

            tracing::warn!(
                operation,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Upstream call failed; retrying"
            );
            tokio::time::sleep(delay).await;
            previous = Some(err);
        }
    }
}
