//! Process configuration: YAML file, then `AUTHGATE__` environment overrides.

use std::path::Path;

use anyhow::Context;
use api_gateway::ApiGatewayConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use identity_resolver::IdentityResolverConfig;
use identity_resolver_sdk::ApplicationCredential;
use secrecy::SecretString;
use serde::Deserialize;
use user_preferences::PreferencesConfig;

use crate::logging::LoggingConfig;

/// Prefix of nested config overrides, e.g. `AUTHGATE__GATEWAY__BIND_ADDR`.
pub const ENV_PREFIX: &str = "AUTHGATE__";
pub const CLIENT_ID_ENV: &str = "AUTHGATE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "AUTHGATE_CLIENT_SECRET";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub gateway: ApiGatewayConfig,
    pub identity_resolver: IdentityResolverConfig,
    pub preferences: PreferencesConfig,
}

impl AppConfig {
    /// Load defaults, then the YAML file (if given), then environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is missing or any source fails to deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")
    }
}

/// Read the application credential from the environment.
///
/// Returns `None` if neither variable is set; service-principal calls then
/// fail at request time. Setting only one of the two is a startup error.
///
/// # Errors
/// Returns an error if exactly one of the two variables is set.
pub fn application_credential_from_env() -> anyhow::Result<Option<ApplicationCredential>> {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    match (read(CLIENT_ID_ENV), read(CLIENT_SECRET_ENV)) {
        (Some(id), Some(secret)) => Ok(Some(ApplicationCredential::new(
            id,
            SecretString::from(secret),
        ))),
        (None, None) => Ok(None),
        (Some(_), None) => anyhow::bail!("{CLIENT_ID_ENV} is set but {CLIENT_SECRET_ENV} is not"),
        (None, Some(_)) => anyhow::bail!("{CLIENT_SECRET_ENV} is set but {CLIENT_ID_ENV} is not"),
    }
}
