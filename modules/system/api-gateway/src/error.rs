//! JSON error responses for authentication failures.

use authgate_security::IsolationError;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use identity_resolver_sdk::{AuthError, ErrorCode};
use serde::Serialize;

/// Error body returned to callers.
///
/// Carries only a code and a generic message; details stay in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Handler error rendered as an [`ErrorBody`] with the mapped status code.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }

    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.0.code(),
            message: self.0.public_message().to_owned(),
            retry_after_seconds: self.0.retry_after_seconds(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl From<IsolationError> for ApiError {
    fn from(e: IsolationError) -> Self {
        Self(AuthError::from(e))
    }
}

fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::AuthenticationFailed(_)
        | AuthError::Unauthorized(_)
        | AuthError::DelegatedCredentialRequired
        | AuthError::IdentityResolutionFailed(_) => StatusCode::UNAUTHORIZED,
        AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AuthError::CircuitOpen | AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Configuration(_) | AuthError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                code = body.code.as_str(),
                error = %self.0,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                code = body.code.as_str(),
                error = %self.0,
                "Request rejected"
            );
        }

        let retry_after = body.retry_after_seconds;
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
