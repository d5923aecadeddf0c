//! Mode selection and per-request upstream client configuration.

use std::sync::Arc;

use authgate_security::{AuthMode, AuthenticationContext};
use identity_resolver_sdk::{ApplicationCredential, ClientAuth, ClientConfig};
use url::Url;

use super::DomainError;

/// Builds upstream client configurations for requests.
///
/// Holds the application credential loaded at startup. The delegated
/// credential is taken from the request context each time and never stored
/// here.
#[derive(Debug, Clone)]
pub struct ModeSelector {
    host: Url,
    app_credential: Option<Arc<ApplicationCredential>>,
}

impl ModeSelector {
    #[must_use]
    pub fn new(host: Url, app_credential: Option<ApplicationCredential>) -> Self {
        Self {
            host,
            app_credential: app_credential.map(Arc::new),
        }
    }

    /// OBO iff a delegated credential is present.
    #[must_use]
    pub fn select(has_delegated_credential: bool) -> AuthMode {
        AuthMode::select(has_delegated_credential)
    }

    #[must_use]
    pub fn has_application_credential(&self) -> bool {
        self.app_credential.is_some()
    }

    /// Build the client configuration matching the request's mode.
    ///
    /// The auth method is always set explicitly, so the delegated and the
    /// application credential can never both end up on one client.
    ///
    /// # Errors
    ///
    /// - [`DomainError::MissingApplicationCredential`] in service-principal
    ///   mode when no application credential was configured
    pub fn build_client_config(
        &self,
        ctx: &AuthenticationContext,
    ) -> Result<ClientConfig, DomainError> {
        let auth = match (ctx.mode(), ctx.delegated_credential()) {
            (AuthMode::Obo, Some(token)) => ClientAuth::DelegatedBearer {
                token: token.clone(),
            },
            (AuthMode::Obo, None) => return Err(DomainError::DelegatedCredentialRequired),
            (AuthMode::ServicePrincipal, _) => {
                let cred = self
                    .app_credential
                    .as_ref()
                    .ok_or(DomainError::MissingApplicationCredential)?;
                ClientAuth::OauthClientCredentials {
                    client_id: cred.client_id().to_owned(),
                    client_secret: cred.client_secret().clone(),
                }
            }
        };

        tracing::debug!(
            mode = %ctx.mode(),
            auth_method = %auth.method(),
            "Upstream client configured"
        );

        Ok(ClientConfig {
            host: self.host.clone(),
            auth,
        })
    }
}
