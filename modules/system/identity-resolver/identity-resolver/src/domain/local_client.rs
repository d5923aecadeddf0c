//! Local (in-process) client for the identity resolver.

use std::sync::Arc;

use async_trait::async_trait;
use authgate_security::{AuthenticationContext, UserIdentity};
use identity_resolver_sdk::{AuthError, BreakerSnapshot, ClientConfig, IdentityResolverClient};

use super::{DomainError, Service};

/// Local client wrapping the service.
///
/// Handed to the gateway and to business modules by the module builder.
pub struct IdentityResolverLocalClient {
    svc: Arc<Service>,
}

impl IdentityResolverLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> AuthError {
    match &e {
        DomainError::MissingApplicationCredential => {
            tracing::error!(operation = op, error = %e, "identity_resolver call failed");
        }
        _ => tracing::warn!(operation = op, error = %e, "identity_resolver call failed"),
    }
    e.into()
}

#[async_trait]
impl IdentityResolverClient for IdentityResolverLocalClient {
    async fn resolve<'a>(
        &self,
        ctx: &'a AuthenticationContext,
    ) -> Result<&'a UserIdentity, AuthError> {
        self.svc
            .resolve(ctx)
            .await
            .map_err(|e| log_and_convert("resolve", e))
    }

    fn client_config(&self, ctx: &AuthenticationContext) -> Result<ClientConfig, AuthError> {
        self.svc
            .client_config(ctx)
            .map_err(|e| log_and_convert("client_config", e))
    }

    fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.svc.breaker_snapshot()
    }
}
