//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (credentials, upstream client, retry policies)
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, CORS, metrics)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, RetryConfig};
use crate::credentials::{CredentialError, CredentialStore};
use crate::http::handlers;
use crate::http::request::{request_span, MakeRequestUuid};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::upstream::{MailgunClient, UpstreamError};

/// Retry policy per upstream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    pub domains: RetryPolicy,
    pub events: RetryPolicy,
    pub pagination: RetryPolicy,
    pub stats: RetryPolicy,
}

impl From<&RetryConfig> for RetryPolicies {
    fn from(config: &RetryConfig) -> Self {
        let base = config.base_delay();
        Self {
            domains: RetryPolicy::new(config.domains_max_retries, base),
            events: RetryPolicy::new(config.events_max_retries, base),
            pagination: RetryPolicy::new(config.pagination_max_retries, base),
            stats: RetryPolicy::new(config.stats_max_retries, base),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub upstream: MailgunClient,
    pub retries: RetryPolicies,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        Ok(Self {
            credentials: Arc::new(CredentialStore::from_accounts(&config.accounts)?),
            upstream: MailgunClient::new(&config.upstream)?,
            retries: RetryPolicies::from(&config.retries),
        })
    }
}

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("credential setup failed: {0}")]
    Credentials(#[from] CredentialError),

    #[error("upstream client setup failed: {0}")]
    Upstream(#[from] UpstreamError),
}

/// HTTP server for the Mailgun proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;

        tracing::info!(
            accounts = state.credentials.len(),
            upstream = %state.upstream.base_url(),
            "Application state ready"
        );

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/domains/{account}", get(handlers::get_domains))
            .route("/api/domains/stats/{account}", get(handlers::get_overall_stats))
            .route("/api/domains/stats/{account}/{domain}", get(handlers::get_domain_stats))
            .route(
                "/api/domains/events/pagination/{account}",
                get(handlers::get_events_pagination),
            )
            .route("/api/domains/events/{account}/{domain}", get(handlers::get_domain_events))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            );

        if config.cors.permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
