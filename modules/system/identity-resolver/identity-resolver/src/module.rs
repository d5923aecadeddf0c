//! Identity resolver module wiring.

use std::sync::Arc;

use anyhow::Context;
use identity_resolver_sdk::{ApplicationCredential, IdentityResolverClient, PlatformIdentityApi};
use url::Url;

use crate::config::IdentityResolverConfig;
use crate::domain::service::identity_issuer;
use crate::domain::{IdentityResolverLocalClient, ModeSelector, Resilience, Service};
use crate::infra::upstream::HttpPlatformClient;

/// Identity resolver module.
///
/// Built once at process start. Owns the process-wide circuit breaker and
/// hands out the [`IdentityResolverClient`] used by the gateway, plus the
/// [`Resilience`] executor that business modules wrap their own upstream
/// calls in.
pub struct IdentityResolverModule {
    service: Arc<Service>,
}

impl IdentityResolverModule {
    /// Build the module with the HTTP upstream client.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream host is not a valid URL or the HTTP
    /// client cannot be constructed.
    pub fn init(
        cfg: &IdentityResolverConfig,
        app_credential: Option<ApplicationCredential>,
    ) -> anyhow::Result<Self> {
        let upstream =
            HttpPlatformClient::new(&cfg.upstream).context("failed to build upstream HTTP client")?;
        Self::with_upstream(cfg, app_credential, Arc::new(upstream))
    }

    /// Build the module around an arbitrary upstream implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream host is not a valid URL, or if another
    /// component already holds the process's identity issuer.
    pub fn with_upstream(
        cfg: &IdentityResolverConfig,
        app_credential: Option<ApplicationCredential>,
        upstream: Arc<dyn PlatformIdentityApi>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            identity_issuer().is_some(),
            "identity issuer already claimed by another component"
        );

        let host = Url::parse(&cfg.upstream.host)
            .with_context(|| format!("invalid upstream host '{}'", cfg.upstream.host))?;

        let selector = ModeSelector::new(host, app_credential);
        if !selector.has_application_credential() {
            tracing::warn!(
                "No application credential configured; service-principal upstream calls will fail"
            );
        }

        let resilience = Arc::new(Resilience::from_config(&cfg.retry, &cfg.breaker));
        let service = Arc::new(Service::new(
            selector,
            upstream,
            resilience,
            cfg.upstream.call_timeout(),
        ));

        tracing::info!(
            upstream_host = %cfg.upstream.host,
            max_attempts = cfg.retry.max_attempts,
            failure_threshold = cfg.breaker.failure_threshold,
            cooldown_ms = cfg.breaker.cooldown_ms,
            "Identity resolver initialized"
        );

        Ok(Self { service })
    }

    /// The public client.
    #[must_use]
    pub fn client(&self) -> Arc<dyn IdentityResolverClient> {
        Arc::new(IdentityResolverLocalClient::new(Arc::clone(&self.service)))
    }

    /// The shared retry executor and circuit breaker.
    #[must_use]
    pub fn resilience(&self) -> Arc<Resilience> {
        Arc::clone(self.service.resilience())
    }
}
