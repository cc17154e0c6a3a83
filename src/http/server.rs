//! Router construction and the serve loop.
//!
//! # Responsibilities
//! - Create the Axum router with both proxy endpoints
//! - Wire up middleware (request ID, tracing, timeout, passthrough gate)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::PASSTHROUGH_PATH;
use crate::config::ProxyConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;
use crate::proxy::{build_client, PassthroughService, ProxyService};
use crate::rewrite::UrlRewriter;
use crate::security::{access_control_middleware, AccessControlState, ApiKeySet};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyService>,
    pub passthrough: Arc<PassthroughService>,
}

/// Query string of both proxy endpoints.
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub url: String,
    pub token: Option<String>,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Build the shared client, key set, rewriter and both services.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(&config)?;
        let keys = Arc::new(ApiKeySet::new(config.api_keys.iter().cloned()));
        let rewriter = Arc::new(UrlRewriter::new(config.rewrite.proxy_base.clone()));

        let proxy = ProxyService::with_builtin_processors(
            client.clone(),
            keys.clone(),
            rewriter,
            &config.pipeline,
        );
        let passthrough = PassthroughService::new(client, &config.passthrough.user_agent);

        let state = AppState {
            proxy: Arc::new(proxy),
            passthrough: Arc::new(passthrough),
        };
        let gate = AccessControlState {
            keys,
            enabled: config.passthrough.require_auth,
        };

        let router = Self::build_router(&config, state, gate);
        Ok(Self { router, config })
    }

    /// Routes plus the layer stack; the request id layer is outermost.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, gate: AccessControlState) -> Router {
        let passthrough = Router::new()
            .route(PASSTHROUGH_PATH, get(passthrough_handler))
            .route_layer(middleware::from_fn_with_state(gate, access_control_middleware));

        Router::new()
            .route(&config.rewrite.proxy_base, get(rewrite_handler))
            .merge(passthrough)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id(req),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until a value arrives on `shutdown`, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_base = %self.config.rewrite.proxy_base,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Configuration the server was built from.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Rewriting proxy endpoint.
async fn rewrite_handler(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let response = state
        .proxy
        .proxy(headers, query.url, query.token)
        .await
        .into_response();
    metrics::record_request("rewrite", response.status().as_u16(), start);
    response
}

/// Passthrough endpoint; the token, if any, was checked by the gate.
async fn passthrough_handler(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let response = state
        .passthrough
        .fetch(&headers, &query.url)
        .await
        .into_response();
    metrics::record_request("passthrough", response.status().as_u16(), start);
    response
}
