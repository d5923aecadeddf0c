//! Domain models for the identity resolver module.

use std::fmt;

use secrecy::SecretString;
use serde::Serialize;
use url::Url;

/// Explicit authentication-method discriminator set on every upstream client.
///
/// The upstream SDK would otherwise auto-detect the method from the process
/// environment, which is ambiguous when application and delegated credentials
/// coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Bearer token acting on behalf of the calling user.
    DelegatedBearer,
    /// `OAuth2` client-credentials exchange with the application credential.
    OauthClientCredentials,
}

impl AuthMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DelegatedBearer => "delegated-bearer",
            Self::OauthClientCredentials => "oauth-client-credentials",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential material for one upstream client. Exactly one branch per client.
#[derive(Debug, Clone)]
pub enum ClientAuth {
    DelegatedBearer {
        token: SecretString,
    },
    OauthClientCredentials {
        client_id: String,
        client_secret: SecretString,
    },
}

impl ClientAuth {
    #[must_use]
    pub fn method(&self) -> AuthMethod {
        match self {
            Self::DelegatedBearer { .. } => AuthMethod::DelegatedBearer,
            Self::OauthClientCredentials { .. } => AuthMethod::OauthClientCredentials,
        }
    }
}

/// Upstream client configuration built per request by the mode selector.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: Url,
    pub auth: ClientAuth,
}

impl ClientConfig {
    #[must_use]
    pub fn auth_method(&self) -> AuthMethod {
        self.auth.method()
    }
}

/// Application-level (service principal) credential.
///
/// Loaded once at process start and read-only afterwards. The secret is a
/// `SecretString`, so `Debug` output is redacted.
#[derive(Debug, Clone)]
pub struct ApplicationCredential {
    client_id: String,
    client_secret: SecretString,
}

impl ApplicationCredential {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecretString>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }
}

/// Circuit breaker state as seen by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of the circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    /// Rate-limit signals seen; recorded for observability, never counted as failures.
    pub rate_limited_total: u64,
    /// How many times the breaker has tripped open since process start.
    pub opened_total: u64,
}
