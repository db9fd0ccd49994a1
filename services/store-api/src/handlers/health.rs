//! Health check handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub client_version: String,
    pub default_region: String,
}

/// GET /health - Liveness probe (fast, no dependencies)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "store-api",
    })
}

/// GET /ready - Readiness probe
///
/// Never calls upstream; reports the client version currently in use.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready",
        service: "store-api",
        client_version: state.auth.client_version().current(),
        default_region: state.auth.default_region().to_string(),
    })
}
