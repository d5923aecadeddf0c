//! Public API trait for the identity resolver.
//!
//! This trait defines the interface that consumers use to resolve the caller
//! identity of a request and to obtain the upstream client configuration that
//! matches the request's authentication mode.

use async_trait::async_trait;
use authgate_security::{AuthenticationContext, UserIdentity};

use crate::error::AuthError;
use crate::models::{BreakerSnapshot, ClientConfig};

/// Public API trait for the identity resolver.
///
/// Constructed once at process start and shared by the gateway and business
/// modules:
///
/// ```ignore
/// let identity = resolver.resolve(&ctx).await?;
/// let scope = authgate_security::require_scope(&ctx)?;
/// repo.find(&scope).await?;
/// ```
///
/// # Security
///
/// The returned identity is always the upstream's answer for the request's
/// delegated credential. No caller-supplied identity claim is ever consulted.
#[async_trait]
pub trait IdentityResolverClient: Send + Sync {
    /// Resolve the caller identity for this request.
    ///
    /// The result is memoized on `ctx`: repeated calls within one request hit
    /// the upstream at most once.
    ///
    /// # Errors
    ///
    /// - `DelegatedCredentialRequired` if the request runs in service-principal mode
    /// - `AuthenticationFailed` if the upstream kept rejecting the credential
    /// - `RateLimited` if the upstream throttled the call
    /// - `CircuitOpen` if the breaker is rejecting calls
    /// - `IdentityResolutionFailed` if the upstream answered with an unusable identity
    /// - `Unavailable` if transient upstream failures exhausted the retry budget
    async fn resolve<'a>(
        &self,
        ctx: &'a AuthenticationContext,
    ) -> Result<&'a UserIdentity, AuthError>;

    /// Build the upstream client configuration for the request's mode.
    ///
    /// # Errors
    ///
    /// - `Configuration` if service-principal mode is selected but no
    ///   application credential was loaded at startup
    fn client_config(&self, ctx: &AuthenticationContext) -> Result<ClientConfig, AuthError>;

    /// Point-in-time view of the process-wide circuit breaker.
    fn breaker_snapshot(&self) -> BreakerSnapshot;
}
