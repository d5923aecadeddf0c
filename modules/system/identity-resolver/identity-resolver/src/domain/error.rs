//! Domain errors for the identity resolver.

use identity_resolver_sdk::{AuthError, UpstreamError};

use super::retry::ResilienceError;

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error(transparent)]
    Upstream(UpstreamError),

    #[error("upstream returned an unusable identity: {0}")]
    UnusableIdentity(String),

    #[error("tenant identity requires a delegated credential")]
    DelegatedCredentialRequired,

    #[error("service-principal mode selected but no application credential is configured")]
    MissingApplicationCredential,

    #[error("identity issuer is held by another component")]
    IssuerUnavailable,
}

impl From<ResilienceError<UpstreamError>> for DomainError {
    fn from(e: ResilienceError<UpstreamError>) -> Self {
        match e {
            ResilienceError::CircuitOpen => Self::CircuitOpen,
            ResilienceError::Operation(inner) => Self::Upstream(inner),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::CircuitOpen => Self::CircuitOpen,
            DomainError::Upstream(upstream) => match upstream {
                UpstreamError::Unauthenticated { .. } => {
                    Self::AuthenticationFailed(upstream.to_string())
                }
                UpstreamError::RateLimited { retry_after } => Self::RateLimited { retry_after },
                UpstreamError::Transient(_) | UpstreamError::Timeout(_) => {
                    Self::Unavailable(upstream.to_string())
                }
                UpstreamError::Rejected { .. } | UpstreamError::InvalidResponse(_) => {
                    Self::IdentityResolutionFailed(upstream.to_string())
                }
                UpstreamError::InvalidRequest(_) => Self::Internal(upstream.to_string()),
            },
            DomainError::UnusableIdentity(reason) => Self::IdentityResolutionFailed(reason),
            DomainError::DelegatedCredentialRequired => Self::DelegatedCredentialRequired,
            DomainError::MissingApplicationCredential => Self::Configuration(
                "no application credential configured for service-principal mode".to_owned(),
            ),
            DomainError::IssuerUnavailable => {
                Self::Internal("identity issuer unavailable".to_owned())
            }
        }
    }
}
