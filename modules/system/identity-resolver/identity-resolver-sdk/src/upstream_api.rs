//! Boundary trait for the upstream platform's identity endpoint.
//!
//! The resolver depends on this trait, never on a concrete HTTP client, so
//! tests can substitute a scripted upstream.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::ClientConfig;

/// Raw "who am I" payload as returned by the upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamIdentity {
    /// Canonical identity field. The only trusted source of the subject id.
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Failures of a single upstream call, before classification.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// 401/403: the credential was rejected.
    #[error("upstream rejected credential (status {status})")]
    Unauthenticated { status: u16 },

    /// 429: the upstream is throttling.
    #[error("upstream rate limited the call")]
    RateLimited { retry_after: Option<Duration> },

    /// 5xx or a transport failure.
    #[error("transient upstream failure: {0}")]
    Transient(String),

    /// The single-call timeout elapsed.
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// Any other non-success status.
    #[error("upstream rejected request (status {status})")]
    Rejected { status: u16 },

    /// 2xx with a body that could not be decoded.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// The request could not be built locally (bad URL, missing token).
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

/// Upstream platform identity API.
#[async_trait]
pub trait PlatformIdentityApi: Send + Sync {
    /// Call the current-identity endpoint with the given client configuration.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] describing how the single call failed.
    async fn current_identity(
        &self,
        config: &ClientConfig,
    ) -> Result<UpstreamIdentity, UpstreamError>;
}
