//! API Gateway module definition.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{HeaderName, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Router, extract::DefaultBodyLimit};
use identity_resolver_sdk::IdentityResolverClient;
use tokio_util::sync::CancellationToken;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::auth;
use crate::config::ApiGatewayConfig;
use crate::middleware::correlation;
use crate::routes;

/// Owns the HTTP surface: built-in routes, business routers and the
/// middleware stack that gives every request its correlation id and
/// authentication context.
pub struct ApiGateway {
    config: ApiGatewayConfig,
    resolver: Arc<dyn IdentityResolverClient>,
    credential_header: HeaderName,
    correlation_header: HeaderName,
}

impl ApiGateway {
    /// # Errors
    /// Returns an error if a configured header name is invalid.
    pub fn new(
        config: ApiGatewayConfig,
        resolver: Arc<dyn IdentityResolverClient>,
    ) -> Result<Self> {
        let (credential_header, correlation_header) = config.headers.parse()?;
        Ok(Self {
            config,
            resolver,
            credential_header,
            correlation_header,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiGatewayConfig {
        &self.config
    }

    /// Build the full router: built-in routes merged with `business`, under
    /// the gateway middleware stack.
    #[must_use]
    pub fn build_router(&self, business: Router) -> Router {
        let router = routes::router(Arc::clone(&self.resolver)).merge(business);
        self.apply_middleware_stack(router)
    }

    /// Apply all middleware layers to a router.
    pub(crate) fn apply_middleware_stack(&self, mut router: Router) -> Router {
        // IMPORTANT: `axum::Router::layer(...)` behaves like Tower layers: the **last** added layer
        // becomes the **outermost** layer and therefore runs **first** on the request path.
        //
        // Desired request execution order (outermost -> innermost):
        // DiscardUnusableCorrelationId -> SetCorrelationId -> PropagateCorrelationId -> Trace
        // -> push_correlation_id_to_extensions -> Timeout -> BodyLimit -> AuthContext -> Router
        //
        // Therefore we must add layers in the reverse order (innermost -> outermost) below.

        // 6) Authentication context (credential extraction + mode selection)
        let auth_state = auth::AuthState {
            credential_header: self.credential_header.clone(),
        };
        router = router.layer(from_fn_with_state(auth_state, auth::auth_context_middleware));

        // 5) Body limit
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));
        router = router.layer(DefaultBodyLimit::max(self.config.body_limit_bytes));

        // 4) Timeout
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            self.config.request_timeout(),
        ));

        // 3) Correlation id into extensions (requires span to exist first => must be inner to Trace)
        let push_header = self.correlation_header.clone();
        router = router.layer(from_fn(
            move |req: axum::extract::Request, next: axum::middleware::Next| {
                correlation::push_correlation_id_to_extensions(push_header.clone(), req, next)
            },
        ));

        // 2) Trace (outer to push_correlation_id_to_extensions)
        let span_header = self.correlation_header.clone();
        router = router.layer({
            use tower_http::trace::TraceLayer;
            use tracing::field::Empty;

            TraceLayer::new_for_http()
                .make_span_with(move |req: &axum::http::Request<axum::body::Body>| {
                    let cid = correlation::read(req.headers(), &span_header)
                        .unwrap_or_else(|| "n/a".to_owned());
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        module = "api_gateway",
                        correlation_id = %cid,
                        status = Empty,
                        latency_ms = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                    },
                )
        });

        // 1) Correlation id handling: drop unusable inbound values, generate if missing,
        // then propagate to the response.
        router = router.layer(PropagateRequestIdLayer::new(self.correlation_header.clone()));
        router = router.layer(SetRequestIdLayer::new(
            self.correlation_header.clone(),
            correlation::MakeCorrelationId,
        ));
        let discard_header = self.correlation_header.clone();
        router = router.layer(from_fn(
            move |req: axum::extract::Request, next: axum::middleware::Next| {
                correlation::discard_unusable(discard_header.clone(), req, next)
            },
        ));

        router
    }

    fn parse_bind_address(bind_addr: &str) -> Result<SocketAddr> {
        bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))
    }

    /// HTTP server: bind, serve until cancelled.
    ///
    /// # Errors
    /// Returns an error if the bind address is invalid, binding fails, or the
    /// server stops with an I/O error.
    pub async fn serve(&self, router: Router, cancel: CancellationToken) -> Result<()> {
        let addr = Self::parse_bind_address(&self.config.bind_addr)?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server bound on {}", addr);

        // Graceful shutdown on cancel
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
