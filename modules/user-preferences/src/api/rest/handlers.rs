use std::sync::Arc;

use api_gateway::{Auth, resolve_scope};
use axum::Json;
use axum::extract::State;

use crate::api::rest::dto::{PreferencesDto, UpdatePreferencesRequest};
use crate::api::rest::error::PreferencesApiError;
use crate::domain::model::PreferencesStats;
use crate::module::PreferencesState;

/// Get the caller's preferences.
pub async fn get_preferences(
    State(state): State<Arc<PreferencesState>>,
    Auth(ctx): Auth,
) -> Result<Json<PreferencesDto>, PreferencesApiError> {
    let scope = resolve_scope(state.resolver.as_ref(), &ctx).await?;
    let prefs = state.service.get_preferences(&scope).await?;
    Ok(Json(prefs.into()))
}

/// Replace the caller's preferences.
pub async fn put_preferences(
    State(state): State<Arc<PreferencesState>>,
    Auth(ctx): Auth,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesDto>, PreferencesApiError> {
    let scope = resolve_scope(state.resolver.as_ref(), &ctx).await?;
    let prefs = state.service.update_preferences(&scope, req.into()).await?;
    Ok(Json(prefs.into()))
}

/// System-level statistics. Needs no caller identity.
pub async fn get_stats(
    State(state): State<Arc<PreferencesState>>,
) -> Result<Json<PreferencesStats>, PreferencesApiError> {
    Ok(Json(state.service.stats().await?))
}
