//! Error types for the identity resolver module.

use std::time::Duration;

use authgate_security::IsolationError;
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error codes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The delegated credential was rejected (expired and malformed are not distinguished).
    AuthExpired,
    /// The request lacks a valid resolved identity for a tenant-scoped operation.
    AuthInvalid,
    /// A tenant-scoped operation was requested without a delegated credential.
    AuthMissing,
    /// The upstream answered, but with an unusable identity.
    AuthIdentityFailed,
    /// The upstream throttled the call.
    AuthRateLimited,
    /// The upstream is unavailable or the breaker is open.
    AuthUnavailable,
    /// Misconfiguration or an unexpected internal failure.
    AuthInternal,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::AuthInvalid => "AUTH_INVALID",
            Self::AuthMissing => "AUTH_MISSING",
            Self::AuthIdentityFailed => "AUTH_IDENTITY_FAILED",
            Self::AuthRateLimited => "AUTH_RATE_LIMITED",
            Self::AuthUnavailable => "AUTH_UNAVAILABLE",
            Self::AuthInternal => "AUTH_INTERNAL",
        }
    }
}

/// Errors that can occur when using the identity resolver API.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The upstream rejected or could not validate the credential, after retries.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The upstream signalled throttling. Never retried.
    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    /// The circuit breaker rejected the call without contacting the upstream.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The "who am I" call succeeded but returned an unusable identity.
    #[error("identity resolution failed: {0}")]
    IdentityResolutionFailed(String),

    /// The isolation guard rejected a tenant-scoped operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Tenant identity was requested for a request without a delegated credential.
    #[error("tenant identity requires a delegated credential")]
    DelegatedCredentialRequired,

    /// Transient upstream failures exhausted the retry budget.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The process is not configured for the requested mode.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AuthenticationFailed(_) => ErrorCode::AuthExpired,
            Self::Unauthorized(_) => ErrorCode::AuthInvalid,
            Self::DelegatedCredentialRequired => ErrorCode::AuthMissing,
            Self::IdentityResolutionFailed(_) => ErrorCode::AuthIdentityFailed,
            Self::RateLimited { .. } => ErrorCode::AuthRateLimited,
            Self::CircuitOpen | Self::Unavailable(_) => ErrorCode::AuthUnavailable,
            Self::Configuration(_) | Self::Internal(_) => ErrorCode::AuthInternal,
        }
    }

    /// Human-readable message safe to show to callers.
    ///
    /// Never includes upstream response bodies, credential fragments or
    /// internal state; those go to the logs only.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => {
                "The delegated credential was rejected or has expired. Please sign in again."
            }
            Self::Unauthorized(_) => "This operation requires a verified caller identity.",
            Self::DelegatedCredentialRequired => {
                "This operation requires a signed-in user; no delegated credential was supplied."
            }
            Self::IdentityResolutionFailed(_) => "The caller identity could not be resolved.",
            Self::RateLimited { .. } => {
                "The identity platform is throttling requests. Please retry later."
            }
            Self::CircuitOpen | Self::Unavailable(_) => {
                "Authentication is temporarily unavailable. Please retry later."
            }
            Self::Configuration(_) | Self::Internal(_) => "An internal authentication error occurred.",
        }
    }

    /// Seconds the caller should wait before retrying, when the upstream said so.
    #[must_use]
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => retry_after.map(|d| d.as_secs().max(1)),
            _ => None,
        }
    }
}

impl From<IsolationError> for AuthError {
    fn from(e: IsolationError) -> Self {
        Self::Unauthorized(e.to_string())
    }
}
