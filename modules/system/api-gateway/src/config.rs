use std::time::Duration;

use authgate_security::constants::{CORRELATION_ID_HEADER, DELEGATED_CREDENTIAL_HEADER};
use http::HeaderName;
use serde::{Deserialize, Serialize};

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

/// API gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiGatewayConfig {
    pub bind_addr: String,

    /// Requests running longer than this are answered with 504.
    pub request_timeout_secs: u64,

    /// Global request body size limit in bytes.
    pub body_limit_bytes: usize,

    /// Header names read and written by the gateway.
    pub headers: HeaderConfig,
}

impl Default for ApiGatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            request_timeout_secs: 30,
            body_limit_bytes: default_body_limit_bytes(),
            headers: HeaderConfig::default(),
        }
    }
}

impl ApiGatewayConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// Header carrying the delegated user credential, injected by the hosting proxy.
    pub delegated_credential: String,
    /// Header carrying the correlation id, inbound and outbound.
    pub correlation_id: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            delegated_credential: DELEGATED_CREDENTIAL_HEADER.to_owned(),
            correlation_id: CORRELATION_ID_HEADER.to_owned(),
        }
    }
}

impl HeaderConfig {
    /// Parse the configured names.
    ///
    /// # Errors
    /// Returns an error if either name is not a valid HTTP header name.
    pub fn parse(&self) -> anyhow::Result<(HeaderName, HeaderName)> {
        let credential = HeaderName::try_from(self.delegated_credential.as_str()).map_err(|e| {
            anyhow::anyhow!(
                "invalid delegated credential header '{}': {e}",
                self.delegated_credential
            )
        })?;
        let correlation = HeaderName::try_from(self.correlation_id.as_str()).map_err(|e| {
            anyhow::anyhow!("invalid correlation id header '{}': {e}", self.correlation_id)
        })?;
        Ok((credential, correlation))
    }
}
