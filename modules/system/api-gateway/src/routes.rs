//! Built-in gateway endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use identity_resolver_sdk::{BreakerSnapshot, IdentityResolverClient};
use serde::Serialize;
use serde_json::{Value, json};

use crate::auth::Auth;
use crate::error::ApiError;

#[derive(Clone)]
pub(crate) struct GatewayState {
    pub(crate) resolver: Arc<dyn IdentityResolverClient>,
}

/// What the gateway knows about the request before any upstream call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub mode: authgate_security::AuthMode,
    pub credential_present: bool,
    pub correlation_id: String,
}

/// The verified caller identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub subject_id: String,
    pub display_name: String,
    pub active: bool,
    pub resolved_at: DateTime<Utc>,
    pub correlation_id: String,
}

pub(crate) fn router(resolver: Arc<dyn IdentityResolverClient>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/v1/context", get(auth_context))
        .route("/auth/v1/me", get(me))
        .route("/auth/v1/breaker", get(breaker))
        .with_state(GatewayState { resolver })
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn auth_context(Auth(ctx): Auth) -> Json<ContextResponse> {
    Json(ContextResponse {
        mode: ctx.mode(),
        credential_present: ctx.has_delegated_credential(),
        correlation_id: ctx.correlation_id().to_owned(),
    })
}

async fn me(
    State(state): State<GatewayState>,
    Auth(ctx): Auth,
) -> Result<Json<MeResponse>, ApiError> {
    let identity = state.resolver.resolve(&ctx).await?;
    Ok(Json(MeResponse {
        subject_id: identity.subject_id().to_owned(),
        display_name: identity.display_name().to_owned(),
        active: identity.is_active(),
        resolved_at: identity.resolved_at(),
        correlation_id: ctx.correlation_id().to_owned(),
    }))
}

async fn breaker(State(state): State<GatewayState>) -> Json<BreakerSnapshot> {
    Json(state.resolver.breaker_snapshot())
}
