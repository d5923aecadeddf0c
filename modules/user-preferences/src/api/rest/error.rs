//! Mapping of preference failures to HTTP responses.

use api_gateway::ApiError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use identity_resolver_sdk::AuthError;
use serde::Serialize;

use crate::domain::error::DomainError;

pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationBody {
    code: &'static str,
    message: String,
    field: String,
}

/// Handler error: authentication failures render as the gateway's error
/// body, validation failures as 422.
#[derive(Debug)]
pub enum PreferencesApiError {
    Auth(ApiError),
    Domain(DomainError),
}

impl From<ApiError> for PreferencesApiError {
    fn from(e: ApiError) -> Self {
        Self::Auth(e)
    }
}

impl From<DomainError> for PreferencesApiError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl IntoResponse for PreferencesApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(e) => e.into_response(),
            Self::Domain(DomainError::Validation { field, message }) => {
                tracing::warn!(field = %field, "Preferences update rejected");
                let body = ValidationBody {
                    code: VALIDATION_FAILED,
                    message: format!("Field '{field}' {message}."),
                    field,
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            Self::Domain(e @ DomainError::Isolation(_)) => {
                ApiError(AuthError::Unauthorized(e.to_string())).into_response()
            }
            Self::Domain(e @ DomainError::Internal(_)) => {
                ApiError(AuthError::Internal(e.to_string())).into_response()
            }
        }
    }
}
