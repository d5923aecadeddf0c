//! `reqwest`-backed implementation of [`PlatformIdentityApi`].

use std::time::Duration;

use async_trait::async_trait;
use identity_resolver_sdk::{
    ClientAuth, ClientConfig, PlatformIdentityApi, UpstreamError, UpstreamIdentity,
};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::config::UpstreamConfig;

/// Token endpoint response for the client-credentials grant.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// HTTP client for the upstream platform.
///
/// One instance is shared by all requests. Credentials are passed in per call
/// through the [`ClientConfig`] and never kept on the client.
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    http: reqwest::Client,
    identity_path: String,
    token_path: String,
    token_scope: String,
    call_timeout: Duration,
}

impl HttpPlatformClient {
    /// Build a client from the upstream configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let call_timeout = cfg.call_timeout();
        let http = reqwest::Client::builder().timeout(call_timeout).build()?;
        Ok(Self {
            http,
            identity_path: cfg.identity_path.clone(),
            token_path: cfg.token_path.clone(),
            token_scope: cfg.token_scope.clone(),
            call_timeout,
        })
    }

    async fn bearer_for(&self, config: &ClientConfig) -> Result<SecretString, UpstreamError> {
        match &config.auth {
            ClientAuth::DelegatedBearer { token } => Ok(token.clone()),
            ClientAuth::OauthClientCredentials {
                client_id,
                client_secret,
            } => {
                self.exchange_client_credentials(&config.host, client_id, client_secret)
                    .await
            }
        }
    }

    async fn exchange_client_credentials(
        &self,
        host: &Url,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<SecretString, UpstreamError> {
        let url = endpoint(host, &self.token_path)?;
        let params = [
            ("grant_type", "client_credentials"),
            ("scope", self.token_scope.as_str()),
        ];

        let response = self
            .http
            .post(url)
            .basic_auth(client_id, Some(client_secret.expose_secret()))
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = ensure_success(response)?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("token response: {e}")))?;
        Ok(SecretString::from(token.access_token))
    }

    fn transport_error(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.call_timeout)
        } else {
            UpstreamError::Transient(format!("transport error: {}", e.without_url()))
        }
    }
}

#[async_trait]
impl PlatformIdentityApi for HttpPlatformClient {
    async fn current_identity(
        &self,
        config: &ClientConfig,
    ) -> Result<UpstreamIdentity, UpstreamError> {
        let bearer = self.bearer_for(config).await?;
        let url = endpoint(&config.host, &self.identity_path)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(bearer.expose_secret())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = ensure_success(response)?;
        response
            .json::<UpstreamIdentity>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }
}

fn endpoint(host: &Url, path: &str) -> Result<Url, UpstreamError> {
    host.join(path)
        .map_err(|e| UpstreamError::InvalidRequest(format!("invalid endpoint '{path}': {e}")))
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(classify_status(status, response.headers()))
}

fn classify_status(status: StatusCode, headers: &HeaderMap) -> UpstreamError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Unauthenticated {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited {
            retry_after: parse_retry_after(headers),
        },
        s if s.is_server_error() => UpstreamError::Transient(format!("status {}", s.as_u16())),
        s => UpstreamError::Rejected { status: s.as_u16() },
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
