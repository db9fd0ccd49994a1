//! Valstore Store API
//!
//! HTTP front-end for cookie login and storefront retrieval.
//!
//! ## REST Endpoints
//!
//! - `POST /api/auth/login/cookies` - Exchange browser cookies for a session token
//! - `GET /api/auth/ping` - Liveness of the API routes
//! - `GET /api/store/data` - Typed storefront for the session's account
//! - `GET /api/store/raw` - Upstream storefront body, untouched
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{header, HeaderValue, Method, Response};
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tokio::signal;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{Level, Span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use valstore_auth_core::{AuthError, AuthService};

use crate::config::{Config, ConfigError};
use crate::error::ApiError;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("store_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Valstore Store API");

    // Load configuration
    let config = Config::from_env()?;
    if config::uses_dev_secret(&config) {
        tracing::warn!("Sessions are signed with the development secret");
    }
    tracing::info!(
        http_port = config.http_port,
        default_region = %config.auth.default_region,
        "Configuration loaded"
    );

    // Create auth service and start client version discovery
    let auth = AuthService::new(config.auth.clone())
        .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;
    let version_task = auth.spawn_version_refresh();

    // Create application state
    let state = AppState::new(auth, config.clone());

    // Build HTTP router
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let result = run_http_server(app, addr).await;

    version_task.abort();
    tracing::info!("Shutdown complete");
    result
}

fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout();
    let slow_threshold = state.config.slow_request_threshold;

    let api = Router::new()
        // Auth routes
        .route("/auth/login/cookies", post(handlers::login_with_cookies))
        .route("/auth/ping", get(handlers::ping))
        // Store routes
        .route("/store/data", get(handlers::store_data))
        .route("/store/raw", get(handlers::store_raw));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details; slow requests are logged at warn
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    move |response: &Response<Body>, latency: Duration, _span: &Span| {
                        let status = response.status().as_u16();
                        let latency_ms = latency.as_millis() as u64;
                        if latency > slow_threshold {
                            tracing::warn!(status, latency_ms, "Slow request");
                        } else {
                            tracing::info!(status, latency_ms, "Request finished");
                        }
                    },
                ),
        )
        // CORS
        .layer(cors_layer(&state.config.allowed_origins))
        // Request timeout (innermost - closest to handler)
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api", api)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .with_state(state)
}

/// Route timeouts share the upstream timeout envelope
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the route timeout");
        ApiError::Auth(AuthError::UpstreamTimeout { operation: "request" })
    } else {
        ApiError::Internal(err.to_string())
    }
}

/// Credentialed CORS for the configured origins only
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|origin| {
            let wildcard = origin.as_str() == "*";
            if wildcard {
                tracing::warn!("Ignoring wildcard CORS origin");
            }
            !wildcard
        })
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-csrf-token"),
        ])
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests;
