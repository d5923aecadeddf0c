#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use authgate_security::{AuthenticationContext, IdentityIssuer, require_scope};
use identity_resolver_sdk::{UpstreamError, UpstreamIdentity};
use tracing_test::traced_test;

use crate::domain::DomainError;
use crate::test_support::{ScriptedUpstream, identity, obo_ctx, service};

#[tokio::test(start_paused = true)]
async fn resolves_identity_from_delegated_credential() {
    let upstream = ScriptedUpstream::new();
    upstream.script("tok-alice", vec![Ok(identity("alice@example.com"))]);
    let svc = service(upstream.clone(), 10);
    let ctx = obo_ctx("tok-alice");

    let id = svc.resolve(&ctx).await.unwrap();

    assert_eq!(id.subject_id(), "alice@example.com");
    assert!(id.is_active());
    assert_eq!(upstream.total_calls(), 1);
    assert_eq!(
        require_scope(&ctx).unwrap().subject().as_str(),
        "alice@example.com"
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_resolution_hits_upstream_once() {
    let upstream = ScriptedUpstream::new();
    let svc = service(upstream.clone(), 10);
    let ctx = obo_ctx("tok-bob");

    let first = svc.resolve(&ctx).await.unwrap();
    let second = svc.resolve(&ctx).await.unwrap();

    assert!(std::ptr::eq(first, second));
    assert_eq!(upstream.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_resolution_on_one_request_hits_upstream_once() {
    let upstream = ScriptedUpstream::with_latency(Duration::from_millis(50));
    let svc = service(upstream.clone(), 10);
    let ctx = obo_ctx("tok-carol");

    let (a, b, c) = tokio::join!(svc.resolve(&ctx), svc.resolve(&ctx), svc.resolve(&ctx));

    assert_eq!(a.unwrap().subject_id(), "tok-carol@example.com");
    assert_eq!(b.unwrap().subject_id(), "tok-carol@example.com");
    assert_eq!(c.unwrap().subject_id(), "tok-carol@example.com");
    assert_eq!(upstream.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn separate_requests_resolve_independently() {
    let upstream = ScriptedUpstream::new();
    let svc = service(upstream.clone(), 10);

    let ctx_a = obo_ctx("tok-a");
    let ctx_b = obo_ctx("tok-b");

    assert_eq!(
        svc.resolve(&ctx_a).await.unwrap().subject_id(),
        "tok-a@example.com"
    );
    assert_eq!(
        svc.resolve(&ctx_b).await.unwrap().subject_id(),
        "tok-b@example.com"
    );
    assert_eq!(upstream.total_calls(), 2);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn service_principal_resolution_fails_fast() {
    let upstream = ScriptedUpstream::new();
    let svc = service(upstream.clone(), 10);
    let ctx = AuthenticationContext::builder().build();

    let err = svc.resolve(&ctx).await.unwrap_err();

    assert!(matches!(err, DomainError::DelegatedCredentialRequired));
    assert_eq!(upstream.total_calls(), 0);
    assert!(ctx.resolved_identity().is_none());
    assert!(logs_contain("refusing to use the application identity"));
}

#[tokio::test(start_paused = true)]
async fn service_principal_client_config_is_available_for_system_calls() {
    let svc = service(ScriptedUpstream::new(), 10);
    let ctx = AuthenticationContext::builder().build();

    let cfg = svc.client_config(&ctx).unwrap();

    assert_eq!(
        cfg.auth_method(),
        identity_resolver_sdk::AuthMethod::OauthClientCredentials
    );
}

#[tokio::test(start_paused = true)]
async fn empty_user_name_is_identity_failure_and_not_retried() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-empty",
        vec![Ok(UpstreamIdentity {
            user_name: "   ".to_owned(),
            display_name: None,
            active: Some(true),
        })],
    );
    let svc = service(upstream.clone(), 10);
    let ctx = obo_ctx("tok-empty");

    let err = svc.resolve(&ctx).await.unwrap_err();

    assert!(matches!(err, DomainError::UnusableIdentity(_)));
    assert_eq!(upstream.total_calls(), 1);
    assert!(ctx.resolved_identity().is_none());
}

#[tokio::test(start_paused = true)]
async fn inactive_identity_is_rejected() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-inactive",
        vec![Ok(UpstreamIdentity {
            user_name: "gone@example.com".to_owned(),
            display_name: None,
            active: Some(false),
        })],
    );
    let svc = service(upstream, 10);

    let err = svc.resolve(&obo_ctx("tok-inactive")).await.unwrap_err();

    assert!(matches!(err, DomainError::UnusableIdentity(_)));
}

#[tokio::test(start_paused = true)]
async fn missing_display_name_falls_back_to_subject() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-dan",
        vec![Ok(UpstreamIdentity {
            user_name: "dan@example.com".to_owned(),
            display_name: None,
            active: None,
        })],
    );
    let svc = service(upstream, 10);
    let ctx = obo_ctx("tok-dan");

    let id = svc.resolve(&ctx).await.unwrap();

    assert_eq!(id.display_name(), "dan@example.com");
    assert!(id.is_active());
}

#[tokio::test(start_paused = true)]
async fn failed_resolution_can_be_retried_on_same_request() {
    let upstream = ScriptedUpstream::new();
    upstream.script(
        "tok-flaky",
        vec![
            Err(UpstreamError::Rejected { status: 404 }),
            Ok(identity("flaky@example.com")),
        ],
    );
    let svc = service(upstream.clone(), 10);
    let ctx = obo_ctx("tok-flaky");

    assert!(svc.resolve(&ctx).await.is_err());
    assert_eq!(
        svc.resolve(&ctx).await.unwrap().subject_id(),
        "flaky@example.com"
    );
    assert_eq!(upstream.total_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn only_the_resolver_can_fill_the_identity_slot() {
    let upstream = ScriptedUpstream::new();
    upstream.script("tok-real", vec![Ok(identity("real@example.com"))]);
    let svc = service(upstream.clone(), 10);

    // The resolver holds the issuer; any other component is refused one.
    assert!(IdentityIssuer::claim().is_none());

    let ctx = obo_ctx("tok-real");
    assert!(require_scope(&ctx).is_err());
    let id = svc.resolve(&ctx).await.unwrap();
    assert_eq!(id.subject_id(), "real@example.com");
    assert_eq!(
        require_scope(&ctx).unwrap().subject().as_str(),
        "real@example.com"
    );
}
