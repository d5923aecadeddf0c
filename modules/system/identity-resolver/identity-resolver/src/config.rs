//! Configuration for the identity resolver.

use std::time::Duration;

use serde::Deserialize;

/// Configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityResolverConfig {
    pub upstream: UpstreamConfig,
    pub retry: RetryConfig,
    pub breaker: BreakerConfig,
}

/// Where and how to reach the upstream platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the platform workspace, e.g. `https://example.cloud.databricks.com`.
    pub host: String,

    /// Path of the "who am I" endpoint, relative to `host`.
    pub identity_path: String,

    /// Path of the `OAuth2` token endpoint used in service-principal mode.
    pub token_path: String,

    /// Scope requested in the client-credentials exchange.
    pub token_scope: String,

    /// Hard bound on a single upstream call.
    pub call_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:8443".to_owned(),
            identity_path: "/api/2.0/preview/scim/v2/Me".to_owned(),
            token_path: "/oidc/v1/token".to_owned(),
            token_scope: "all-apis".to_owned(),
            call_timeout_ms: 30_000,
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Retry executor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on every further retry.
    pub base_delay_ms: u64,

    /// Upper bound on a single backoff delay.
    pub max_delay_ms: u64,

    /// Wall-clock budget across all attempts of one operation.
    pub budget_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 400,
            budget_ms: 5_000,
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive retryable failures that trip the breaker.
    pub failure_threshold: u32,

    /// How long the breaker stays open before admitting a probe.
    pub cooldown_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 10,
            cooldown_ms: 30_000,
        }
    }
}
