use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::api::rest::handlers;
use crate::module::PreferencesState;

pub fn register_routes(state: Arc<PreferencesState>) -> Router {
    Router::new()
        .route(
            "/preferences/v1/me",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .route("/preferences/v1/stats", get(handlers::get_stats))
        .with_state(state)
}
