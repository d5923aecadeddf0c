#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Correlation id reuse, generation and echo.

mod common;

use axum::http::StatusCode;
use common::{ALICE_TOKEN, Harness, get, json_body, send};
use identity_resolver_sdk::UpstreamError;
use uuid::Uuid;

fn echoed(res: &axum::http::Response<axum::body::Body>) -> String {
    res.headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_owned()
}

#[tokio::test]
async fn inbound_id_is_reused_verbatim() {
    let h = Harness::new(10);
    let app = h.app();

    let res = send(
        &app,
        get("/auth/v1/context").header("x-correlation-id", "req-2024-11-05-abc"),
    )
    .await;

    assert_eq!(echoed(&res), "req-2024-11-05-abc");
    assert_eq!(json_body(res).await["correlationId"], "req-2024-11-05-abc");
}

#[tokio::test]
async fn missing_id_is_generated_as_uuid_v4() {
    let h = Harness::new(10);
    let app = h.app();

    let res = send(&app, get("/auth/v1/context")).await;

    let id = echoed(&res);
    assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    assert_eq!(json_body(res).await["correlationId"], id.as_str());
}

#[tokio::test]
async fn unusable_inbound_id_is_replaced() {
    let h = Harness::new(10);
    let app = h.app();
    let oversized = "x".repeat(300);

    for bad in ["", "has space", oversized.as_str()] {
        let res = send(&app, get("/auth/v1/context").header("x-correlation-id", bad)).await;
        let id = echoed(&res);
        assert_ne!(id, bad);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}

#[tokio::test]
async fn distinct_requests_get_distinct_ids() {
    let h = Harness::new(10);
    let app = h.app();

    let a = echoed(&send(&app, get("/health")).await);
    let b = echoed(&send(&app, get("/health")).await);

    assert_ne!(a, b);
}

#[tokio::test]
async fn error_responses_echo_the_id() {
    let h = Harness::new(10);
    h.upstream.script(
        ALICE_TOKEN,
        vec![Err(UpstreamError::RateLimited { retry_after: None })],
    );
    let app = h.app();

    let res = send(
        &app,
        get("/auth/v1/me")
            .header("x-forwarded-access-token", ALICE_TOKEN)
            .header("x-correlation-id", "corr-on-error"),
    )
    .await;

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(echoed(&res), "corr-on-error");
    assert!(res.headers().get("retry-after").is_none());
}

#[tokio::test]
async fn configured_header_name_is_honoured() {
    let mut cfg = api_gateway::ApiGatewayConfig::default();
    cfg.headers.correlation_id = "X-Request-Id".to_owned();
    let h = Harness::with_gateway_config(10, cfg);
    let app = h.app();

    let res = send(&app, get("/auth/v1/context").header("x-request-id", "abc-123")).await;

    assert_eq!(
        res.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
    assert!(res.headers().get("x-correlation-id").is_none());
}
