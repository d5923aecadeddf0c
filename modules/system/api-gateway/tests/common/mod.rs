#![allow(dead_code)]

//! Shared fixtures: a scripted upstream and a gateway wired to it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use api_gateway::{ApiGateway, ApiGatewayConfig};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use identity_resolver::{IdentityResolverConfig, IdentityResolverModule};
use identity_resolver_sdk::{
    ApplicationCredential, ClientAuth, ClientConfig, PlatformIdentityApi, UpstreamError,
    UpstreamIdentity,
};
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use tower::ServiceExt;

pub const ALICE_TOKEN: &str = "token-for-alice-0001";
pub const BOB_TOKEN: &str = "token-for-bob-0002";

type Outcome = Result<UpstreamIdentity, UpstreamError>;

/// Upstream whose answers are keyed by bearer token. Unscripted tokens get
/// an identity named after the token; scripted outcomes are consumed in order.
#[derive(Default)]
pub struct FakeUpstream {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeUpstream {
    pub fn script(&self, token: &str, outcomes: Vec<Outcome>) {
        self.scripts
            .lock()
            .insert(token.to_owned(), outcomes.into_iter().collect());
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl PlatformIdentityApi for FakeUpstream {
    async fn current_identity(&self, config: &ClientConfig) -> Outcome {
        let key = match &config.auth {
            ClientAuth::DelegatedBearer { token } => token.expose_secret().to_owned(),
            ClientAuth::OauthClientCredentials { client_id, .. } => format!("app:{client_id}"),
        };
        self.calls.lock().push(key.clone());

        if let Some(next) = self
            .scripts
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        Ok(identity(&format!("{}@example.com", key.trim_start_matches("token-for-"))))
    }
}

pub fn identity(user_name: &str) -> UpstreamIdentity {
    UpstreamIdentity {
        user_name: user_name.to_owned(),
        display_name: None,
        active: Some(true),
    }
}

pub fn resolver_config(failure_threshold: u32) -> IdentityResolverConfig {
    let mut cfg = IdentityResolverConfig::default();
    cfg.retry.base_delay_ms = 1;
    cfg.retry.max_delay_ms = 2;
    cfg.breaker.failure_threshold = failure_threshold;
    cfg
}

pub struct Harness {
    pub upstream: Arc<FakeUpstream>,
    pub module: IdentityResolverModule,
    pub gateway: ApiGateway,
}

impl Harness {
    pub fn new(failure_threshold: u32) -> Self {
        Self::with_gateway_config(failure_threshold, ApiGatewayConfig::default())
    }

    pub fn with_gateway_config(failure_threshold: u32, gateway_cfg: ApiGatewayConfig) -> Self {
        let upstream = Arc::new(FakeUpstream::default());
        let module = IdentityResolverModule::with_upstream(
            &resolver_config(failure_threshold),
            Some(ApplicationCredential::new("app-id", "app-secret".to_owned())),
            Arc::clone(&upstream) as Arc<dyn PlatformIdentityApi>,
        )
        .unwrap();
        let gateway = ApiGateway::new(gateway_cfg, module.client()).unwrap();
        Self {
            upstream,
            module,
            gateway,
        }
    }

    pub fn app(&self) -> Router {
        self.gateway.build_router(Router::new())
    }
}

pub fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

pub async fn send(app: &Router, req: axum::http::request::Builder) -> Response<Body> {
    app.clone().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

pub async fn json_body(res: Response<Body>) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
