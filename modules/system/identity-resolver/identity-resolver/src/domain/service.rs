//! Identity resolution service.
//!
//! Resolves the caller identity of a request from the upstream "who am I"
//! endpoint using the request's own delegated credential, through the shared
//! retry executor and circuit breaker, and memoizes the result on the request
//! context.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use authgate_security::{AuthMode, AuthenticationContext, IdentityIssuer, UserIdentity};
use chrono::Utc;
use identity_resolver_sdk::{
    BreakerSnapshot, ClientConfig, PlatformIdentityApi, UpstreamError, UpstreamIdentity,
};

use super::DomainError;
use super::mode::ModeSelector;
use super::retry::{FailureClass, Resilience};

/// Classify an upstream failure for the retry executor.
///
/// Credential rejections are retried because the upstream occasionally
/// rejects valid tokens during propagation.
#[must_use]
pub fn classify_upstream(e: &UpstreamError) -> FailureClass {
    match e {
        UpstreamError::Unauthenticated { .. }
        | UpstreamError::Transient(_)
        | UpstreamError::Timeout(_) => FailureClass::Retryable,
        UpstreamError::RateLimited { .. } => FailureClass::RateLimited,
        UpstreamError::Rejected { .. }
        | UpstreamError::InvalidResponse(_)
        | UpstreamError::InvalidRequest(_) => FailureClass::Permanent,
    }
}

static ISSUER: LazyLock<Option<IdentityIssuer>> = LazyLock::new(IdentityIssuer::claim);

/// The process's identity issuer, claimed the first time a resolver is built.
///
/// `None` if another component claimed it first.
pub(crate) fn identity_issuer() -> Option<&'static IdentityIssuer> {
    ISSUER.as_ref()
}

/// Identity resolver service.
pub struct Service {
    issuer: Option<&'static IdentityIssuer>,
    selector: ModeSelector,
    upstream: Arc<dyn PlatformIdentityApi>,
    resilience: Arc<Resilience>,
    call_timeout: Duration,
}

impl Service {
    #[must_use]
    pub fn new(
        selector: ModeSelector,
        upstream: Arc<dyn PlatformIdentityApi>,
        resilience: Arc<Resilience>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            issuer: identity_issuer(),
            selector,
            upstream,
            resilience,
            call_timeout,
        }
    }

    /// Resolve the caller identity of the request.
    ///
    /// The upstream is called at most once per request context; later calls
    /// return the memoized identity.
    ///
    /// # Errors
    ///
    /// - [`DomainError::DelegatedCredentialRequired`] in service-principal mode
    /// - [`DomainError::CircuitOpen`] if the breaker rejected the call
    /// - [`DomainError::Upstream`] with the last upstream failure
    /// - [`DomainError::UnusableIdentity`] if the answer cannot identify a user
    /// - [`DomainError::IssuerUnavailable`] if this process's issuer belongs elsewhere
    #[tracing::instrument(skip_all, fields(mode = %ctx.mode()))]
    pub async fn resolve<'a>(
        &self,
        ctx: &'a AuthenticationContext,
    ) -> Result<&'a UserIdentity, DomainError> {
        if ctx.mode() == AuthMode::ServicePrincipal {
            tracing::error!(
                "Tenant identity requested without a delegated credential; refusing to use the application identity"
            );
            return Err(DomainError::DelegatedCredentialRequired);
        }

        let Some(issuer) = self.issuer else {
            tracing::error!("Identity issuer is held by another component; refusing to resolve");
            return Err(DomainError::IssuerUnavailable);
        };

        ctx.identity_or_try_init(issuer, || self.fetch_identity(ctx))
            .await
    }

    /// Upstream client configuration for the request's mode.
    ///
    /// # Errors
    ///
    /// See [`ModeSelector::build_client_config`].
    pub fn client_config(&self, ctx: &AuthenticationContext) -> Result<ClientConfig, DomainError> {
        self.selector.build_client_config(ctx)
    }

    #[must_use]
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.resilience.breaker_snapshot()
    }

    #[must_use]
    pub fn resilience(&self) -> &Arc<Resilience> {
        &self.resilience
    }

    async fn fetch_identity(&self, ctx: &AuthenticationContext) -> Result<UserIdentity, DomainError> {
        let config = self.selector.build_client_config(ctx)?;
        let config = &config;

        let raw = self
            .resilience
            .execute(
                "current_identity",
                move |_| self.call_upstream(config),
                classify_upstream,
            )
            .await?;

        let identity = into_identity(raw)?;
        tracing::info!(is_active = identity.is_active(), "Caller identity resolved");
        Ok(identity)
    }

    async fn call_upstream(&self, config: &ClientConfig) -> Result<UpstreamIdentity, UpstreamError> {
        tokio::time::timeout(self.call_timeout, self.upstream.current_identity(config))
            .await
            .unwrap_or(Err(UpstreamError::Timeout(self.call_timeout)))
    }
}

fn into_identity(raw: UpstreamIdentity) -> Result<UserIdentity, DomainError> {
    if raw.user_name.trim().is_empty() {
        return Err(DomainError::UnusableIdentity(
            "upstream identity has no userName".to_owned(),
        ));
    }
    if raw.active == Some(false) {
        return Err(DomainError::UnusableIdentity(
            "upstream identity is inactive".to_owned(),
        ));
    }

    let display_name = raw
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| raw.user_name.clone());

    Ok(UserIdentity::new(
        raw.user_name,
        display_name,
        raw.active.unwrap_or(true),
        Utc::now(),
    ))
}
