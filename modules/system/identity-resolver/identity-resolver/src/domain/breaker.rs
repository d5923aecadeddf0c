//! Process-wide circuit breaker guarding the upstream platform.
//!
//! State lives behind a synchronous mutex that is only held for the few
//! instructions of a transition, never across an `.await`. Time is read from
//! `tokio::time::Instant` so cooldowns follow the runtime clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use identity_resolver_sdk::{BreakerSnapshot, BreakerState};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::BreakerConfig;

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Consecutive-failure circuit breaker with a single half-open probe.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
    rate_limited_total: AtomicU64,
    opened_total: AtomicU64,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
            rate_limited_total: AtomicU64::new(0),
            opened_total: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn from_config(cfg: &BreakerConfig) -> Self {
        Self::new(cfg.failure_threshold, Duration::from_millis(cfg.cooldown_ms))
    }

    /// Ask for permission to call the upstream.
    ///
    /// Returns `None` while the breaker is open, or while a half-open probe is
    /// already in flight. The outcome of the call must be reported through the
    /// returned permit; a permit dropped without an outcome (cancelled call)
    /// frees the probe slot and leaves the counters untouched.
    #[must_use]
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => Some(CallPermit::new(self, false)),
            BreakerState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_none_or(|at| at.elapsed() >= self.cooldown);
                if !cooled_down {
                    return None;
                }
                inner.state = BreakerState::HalfOpen;
                inner.probe_in_flight = true;
                tracing::info!(
                    from = "OPEN",
                    to = "HALF_OPEN",
                    "Circuit breaker cooldown elapsed; admitting probe"
                );
                Some(CallPermit::new(self, true))
            }
            BreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    return None;
                }
                inner.probe_in_flight = true;
                Some(CallPermit::new(self, true))
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            failure_threshold: self.failure_threshold,
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
            opened_total: self.opened_total.load(Ordering::Relaxed),
        }
    }

    fn on_success(&self, probe: bool) {
        let mut inner = self.inner.lock();
        if probe {
            inner.probe_in_flight = false;
        }
        let previous = inner.state;
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        if previous != BreakerState::Closed {
            tracing::info!(
                from = state_name(previous),
                to = "CLOSED",
                "Circuit breaker closed"
            );
        }
    }

    fn on_failure(&self, probe: bool) -> BreakerState {
        let mut inner = self.inner.lock();
        if probe {
            inner.probe_in_flight = false;
        }
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        match inner.state {
            BreakerState::Closed if inner.consecutive_failures >= self.failure_threshold => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                self.opened_total.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    from = "CLOSED",
                    to = "OPEN",
                    consecutive_failures = inner.consecutive_failures,
                    "Circuit breaker opened after {} consecutive failures",
                    inner.consecutive_failures
                );
            }
            BreakerState::HalfOpen if probe => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                self.opened_total.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    from = "HALF_OPEN",
                    to = "OPEN",
                    "Circuit breaker probe failed; reopening"
                );
            }
            _ => {}
        }
        inner.state
    }

    fn on_rate_limited(&self, probe: bool) {
        if probe {
            self.inner.lock().probe_in_flight = false;
        }
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    fn on_abandoned(&self) {
        self.inner.lock().probe_in_flight = false;
    }
}

fn state_name(state: BreakerState) -> &'static str {
    match state {
        BreakerState::Closed => "CLOSED",
        BreakerState::Open => "OPEN",
        BreakerState::HalfOpen => "HALF_OPEN",
    }
}

/// Permission for one upstream call, obtained from [`CircuitBreaker::try_acquire`].
#[must_use = "the call outcome must be reported to the breaker"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    /// Whether this call is the single half-open probe.
    #[must_use]
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    /// The upstream answered. Resets the failure count and closes the breaker.
    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.probe);
    }

    /// The call failed in a way that counts against upstream availability.
    ///
    /// Returns the breaker state after the failure was recorded.
    pub fn record_failure(mut self) -> BreakerState {
        self.settled = true;
        self.breaker.on_failure(self.probe)
    }

    /// The upstream throttled the call. Counted separately, never as a failure.
    pub fn record_rate_limited(mut self) {
        self.settled = true;
        self.breaker.on_rate_limited(self.probe);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.on_abandoned();
        }
    }
}
