#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authgate_security::AuthenticationContext;
use identity_resolver_sdk::{
    ApplicationCredential, ClientAuth, ClientConfig, PlatformIdentityApi, UpstreamError,
    UpstreamIdentity,
};
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use tokio::time::Instant;
use url::Url;

use crate::domain::{CircuitBreaker, ModeSelector, Resilience, RetryPolicy, Service};

pub type Outcome = Result<UpstreamIdentity, UpstreamError>;

/// Upstream double keyed by the credential it is called with.
///
/// Unscripted calls succeed with `<token>@example.com`.
#[derive(Default)]
pub struct ScriptedUpstream {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
}

impl ScriptedUpstream {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    pub fn script(&self, key: &str, outcomes: Vec<Outcome>) {
        self.scripts
            .lock()
            .insert(key.to_owned(), outcomes.into_iter().collect());
    }

    #[must_use]
    pub fn calls_for(&self, key: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, at)| *at)
            .collect()
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl PlatformIdentityApi for ScriptedUpstream {
    async fn current_identity(&self, config: &ClientConfig) -> Outcome {
        let key = match &config.auth {
            ClientAuth::DelegatedBearer { token } => token.expose_secret().to_owned(),
            ClientAuth::OauthClientCredentials { client_id, .. } => format!("app:{client_id}"),
        };
        self.calls.lock().push((key.clone(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.scripts.lock().get_mut(&key).and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| Ok(identity(&format!("{key}@example.com"))))
    }
}

#[must_use]
pub fn identity(user_name: &str) -> UpstreamIdentity {
    UpstreamIdentity {
        user_name: user_name.to_owned(),
        display_name: Some(user_name.to_owned()),
        active: Some(true),
    }
}

#[must_use]
pub fn transient() -> Outcome {
    Err(UpstreamError::Transient("status 503".to_owned()))
}

#[must_use]
pub fn unauthenticated() -> Outcome {
    Err(UpstreamError::Unauthenticated { status: 401 })
}

#[must_use]
pub fn obo_ctx(token: &str) -> AuthenticationContext {
    AuthenticationContext::builder()
        .delegated_credential(token.to_owned())
        .build()
}

#[must_use]
pub fn service(upstream: Arc<ScriptedUpstream>, failure_threshold: u32) -> Service {
    let resilience = Arc::new(Resilience::new(
        RetryPolicy::default(),
        Arc::new(CircuitBreaker::new(
            failure_threshold,
            Duration::from_secs(30),
        )),
    ));
    let selector = ModeSelector::new(
        Url::parse("https://workspace.example.com").unwrap(),
        Some(ApplicationCredential::new("app-id", "app-secret".to_owned())),
    );
    Service::new(selector, upstream, resilience, Duration::from_secs(30))
}
