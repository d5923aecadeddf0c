use std::fmt;

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::identity::UserIdentity;
use crate::issuer::IdentityIssuer;

/// Which credential the request uses when calling the upstream platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMode {
    /// On-behalf-of the calling user, with their delegated credential.
    Obo,
    /// Application-level credential of the system itself.
    ServicePrincipal,
}

impl AuthMode {
    /// Pure mapping from credential presence to mode.
    #[must_use]
    pub fn select(has_delegated_credential: bool) -> Self {
        if has_delegated_credential {
            Self::Obo
        } else {
            Self::ServicePrincipal
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Obo => "OBO",
            Self::ServicePrincipal => "SERVICE_PRINCIPAL",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `AuthenticationContext` carries the authentication state of a single request.
///
/// Built by the gateway middleware at request entry and dropped when the response
/// completes. Everything except the identity slot is fixed at construction; the
/// identity slot is filled at most once by the identity resolver and is never
/// refreshed mid-request.
///
/// The context is intentionally not `Clone` or `Serialize`: share it by `Arc`
/// within one request and never persist it.
pub struct AuthenticationContext {
    /// Raw delegated credential. Wrapped in `SecretString` so `Debug` redacts it.
    delegated_credential: Option<SecretString>,
    mode: AuthMode,
    correlation_id: String,
    resolved_identity: OnceCell<UserIdentity>,
}

impl AuthenticationContext {
    /// Create a new `AuthenticationContext` builder
    #[must_use]
    pub fn builder() -> AuthenticationContextBuilder {
        AuthenticationContextBuilder::default()
    }

    /// Get the delegated credential, if the request carried a usable one.
    #[must_use]
    pub fn delegated_credential(&self) -> Option<&SecretString> {
        self.delegated_credential.as_ref()
    }

    #[must_use]
    pub fn has_delegated_credential(&self) -> bool {
        self.delegated_credential.is_some()
    }

    /// Get the mode derived from credential presence at construction time.
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Get the identity if it has already been resolved for this request.
    #[must_use]
    pub fn resolved_identity(&self) -> Option<&UserIdentity> {
        self.resolved_identity.get()
    }

    /// Return the memoized identity, running `init` only if nothing is stored yet.
    ///
    /// Only the holder of the process's [`IdentityIssuer`] can fill the slot.
    /// Concurrent callers within the same request wait for a single in-flight
    /// `init`; a failed `init` leaves the slot empty.
    ///
    /// # Errors
    /// Returns whatever `init` returns when it fails.
    pub async fn identity_or_try_init<F, Fut, E>(
        &self,
        _issuer: &IdentityIssuer,
        init: F,
    ) -> Result<&UserIdentity, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<UserIdentity, E>>,
    {
        self.resolved_identity.get_or_try_init(init).await
    }
}

impl fmt::Debug for AuthenticationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationContext")
            .field("has_delegated_credential", &self.has_delegated_credential())
            .field("mode", &self.mode)
            .field("correlation_id", &self.correlation_id)
            .field("resolved_identity", &self.resolved_identity.get())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct AuthenticationContextBuilder {
    delegated_credential: Option<SecretString>,
    correlation_id: Option<String>,
}

impl AuthenticationContextBuilder {
    #[must_use]
    pub fn delegated_credential(mut self, credential: impl Into<SecretString>) -> Self {
        self.delegated_credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn maybe_delegated_credential(mut self, credential: Option<SecretString>) -> Self {
        self.delegated_credential = credential;
        self
    }

    #[must_use]
    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Build the context. A missing correlation id is replaced by a fresh UUID.
    #[must_use]
    pub fn build(self) -> AuthenticationContext {
        let mode = AuthMode::select(self.delegated_credential.is_some());
        AuthenticationContext {
            delegated_credential: self.delegated_credential,
            mode,
            correlation_id: self
                .correlation_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            resolved_identity: OnceCell::new(),
        }
    }
}
