#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use identity_resolver_sdk::{AuthError, BreakerState, ErrorCode, UpstreamError};
use tokio::time::Instant;
use tracing_test::traced_test;

use crate::domain::DomainError;
use crate::test_support::{
    ScriptedUpstream, identity, obo_ctx, service, transient, unauthenticated,
};

fn gaps(calls: &[Instant]) -> Vec<Duration> {
    calls.windows(2).map(|w| w[1].duration_since(w[0])).collect()
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn transient_failures_are_retried_with_backoff() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok",
        vec![transient(), transient(), Ok(identity("eve@example.com"))],
    );
    let svc = service(upstream.clone(), 10);

    let ctx = obo_ctx("tok");
    let id = svc.resolve(&ctx).await.unwrap();

    assert_eq!(id.subject_id(), "eve@example.com");
    let calls = upstream.calls_for("tok");
    assert_eq!(calls.len(), 3);
    assert_eq!(
        gaps(&calls),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert!(logs_contain("Upstream call failed; retrying"));
}

#[tokio::test(start_paused = true)]
async fn repeated_credential_rejection_becomes_authentication_failure() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-expired",
        vec![unauthenticated(), unauthenticated(), unauthenticated()],
    );
    let svc = service(upstream.clone(), 10);

    let err = svc.resolve(&obo_ctx("tok-expired")).await.unwrap_err();

    assert_eq!(upstream.total_calls(), 3);
    assert_eq!(AuthError::from(err).code(), ErrorCode::AuthExpired);
}

#[tokio::test(start_paused = true)]
async fn credential_rejection_then_success_recovers() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-new",
        vec![unauthenticated(), Ok(identity("fresh@example.com"))],
    );
    let svc = service(upstream.clone(), 10);

    let id = svc.resolve(&obo_ctx("tok-new")).await.unwrap().clone();

    assert_eq!(id.subject_id(), "fresh@example.com");
    assert_eq!(upstream.total_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_is_surfaced_immediately() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-busy",
        vec![Err(UpstreamError::RateLimited {
            retry_after: Some(Duration::from_secs(4)),
        })],
    );
    let svc = service(upstream.clone(), 10);

    let err = svc.resolve(&obo_ctx("tok-busy")).await.unwrap_err();

    assert_eq!(upstream.total_calls(), 1);
    let err = AuthError::from(err);
    assert_eq!(err.code(), ErrorCode::AuthRateLimited);
    assert_eq!(err.retry_after_seconds(), Some(4));

    let snap = svc.breaker_snapshot();
    assert_eq!(snap.consecutive_failures, 0);
    assert_eq!(snap.rate_limited_total, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_upstream_times_out_and_budget_stops_retries() {
    let upstream = ScriptedUpstream::with_latency(Duration::from_secs(60));
    let svc = service(upstream.clone(), 10);
    let started = Instant::now();

    let err = svc.resolve(&obo_ctx("tok-slow")).await.unwrap_err();

    // One 30s attempt already exceeds the 5s budget.
    assert!(matches!(
        err,
        DomainError::Upstream(UpstreamError::Timeout(t)) if t == Duration::from_secs(30)
    ));
    assert_eq!(upstream.total_calls(), 1);
    assert_eq!(started.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn breaker_opens_at_threshold_and_recovers_after_cooldown() {
    let upstream = ScriptedUpstream::new();
    upstream.script("tok-down", (0..10).map(|_| transient()).collect());
    let svc = service(upstream.clone(), 10);

    // 3 + 3 + 3 failures leave the breaker closed; the 10th trips it.
    for _ in 0..3 {
        let err = svc.resolve(&obo_ctx("tok-down")).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream(UpstreamError::Transient(_))));
        assert_eq!(svc.breaker_snapshot().state, BreakerState::Closed);
    }
    let err = svc.resolve(&obo_ctx("tok-down")).await.unwrap_err();
    assert!(matches!(err, DomainError::Upstream(UpstreamError::Transient(_))));
    assert_eq!(upstream.total_calls(), 10);

    let snap = svc.breaker_snapshot();
    assert_eq!(snap.state, BreakerState::Open);
    assert_eq!(snap.consecutive_failures, 10);
    assert_eq!(snap.opened_total, 1);
    assert!(logs_contain("Circuit breaker opened"));

    // While open: rejected without touching the upstream.
    let err = svc.resolve(&obo_ctx("tok-down")).await.unwrap_err();
    assert!(matches!(err, DomainError::CircuitOpen));
    assert_eq!(upstream.total_calls(), 10);

    // After the cooldown a single probe goes through and closes the breaker.
    tokio::time::advance(Duration::from_secs(30)).await;
    let ctx = obo_ctx("tok-down");
    let id = svc.resolve(&ctx).await.unwrap();
    assert_eq!(id.subject_id(), "tok-down@example.com");
    assert_eq!(upstream.total_calls(), 11);
    assert_eq!(svc.breaker_snapshot().state, BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_retry_independently() {
    let upstream = ScriptedUpstream::with_latency(Duration::from_millis(20));
    let tokens: Vec<String> = (0..5).map(|i| format!("tok-{i}")).collect();
    for token in &tokens {
        upstream.script(
            token,
            vec![transient(), transient(), Ok(identity(&format!("{token}@corp")))],
        );
    }
    // High enough that 5 x 2 failures cannot trip it.
    let svc = Arc::new(service(upstream.clone(), 20));

    let handles: Vec<_> = tokens
        .iter()
        .cloned()
        .map(|token| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                let ctx = obo_ctx(&token);
                svc.resolve(&ctx)
                    .await
                    .map(|id| id.subject_id().to_owned())
                    .map_err(|e| e.to_string())
            })
        })
        .collect();

    for (token, handle) in tokens.iter().zip(handles) {
        assert_eq!(handle.await.unwrap().unwrap(), format!("{token}@corp"));
    }

    assert_eq!(upstream.total_calls(), 15);
    for token in &tokens {
        let calls = upstream.calls_for(token);
        assert_eq!(calls.len(), 3, "{token} should be called exactly 3 times");
        let [first, .., last] = calls.as_slice() else {
            panic!("expected three calls for {token}");
        };
        // Every request's retry window overlaps every other request's.
        for other in &tokens {
            let other_calls = upstream.calls_for(other);
            assert!(other_calls[0] <= *last && *first <= other_calls[2]);
        }
    }
    assert_eq!(svc.breaker_snapshot().state, BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn cancelled_request_stops_retrying() {
    let upstream = ScriptedUpstream::new();
    upstream.script("tok-gone", vec![transient(), transient(), transient()]);
    let svc = Arc::new(service(upstream.clone(), 10));

    let task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            let ctx = obo_ctx("tok-gone");
            svc.resolve(&ctx).await.map(|_| ()).map_err(|e| e.to_string())
        })
    };

    // First attempt fails at once; the task is now in its 100ms backoff.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(upstream.total_calls(), 1);
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    tokio::time::advance(Duration::from_secs(10)).await;

    assert_eq!(upstream.total_calls(), 1);
    assert_eq!(svc.breaker_snapshot().consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_half_open_probe_frees_the_slot() {
    let upstream = ScriptedUpstream::with_latency(Duration::from_secs(1));
    upstream.script("tok-probe", vec![transient()]);
    let svc = Arc::new(service(upstream.clone(), 1));

    let err = svc.resolve(&obo_ctx("tok-probe")).await.unwrap_err();
    assert!(matches!(err, DomainError::Upstream(UpstreamError::Transient(_))));
    assert_eq!(svc.breaker_snapshot().state, BreakerState::Open);

    tokio::time::advance(Duration::from_secs(30)).await;
    let task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            let ctx = obo_ctx("tok-probe");
            svc.resolve(&ctx).await.map(|_| ()).map_err(|e| e.to_string())
        })
    };

    // The probe is in flight inside the 1s upstream call.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(upstream.total_calls(), 2);
    assert_eq!(svc.breaker_snapshot().state, BreakerState::HalfOpen);
    assert!(svc.resilience().breaker().try_acquire().is_none());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    let probe = svc
        .resilience()
        .breaker()
        .try_acquire()
        .expect("a new probe is admitted");
    assert!(probe.is_probe());
    probe.record_success();
    assert_eq!(svc.breaker_snapshot().state, BreakerState::Closed);
}
