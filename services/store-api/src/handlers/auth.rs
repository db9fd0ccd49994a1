//! Authentication handlers (cookie login, ping)

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::TOKEN_NAME;
use crate::handlers::ApiSuccess;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CookieLoginRequest {
    /// Raw cookie string copied from the browser
    pub cookies: String,
    /// Region code; unknown or missing codes use the server default
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub user_id: String,
    pub region: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login/cookies
///
/// Exchange browser cookies for a signed session token
pub async fn login_with_cookies(
    State(state): State<AppState>,
    payload: Result<Json<CookieLoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .auth
        .login(&req.cookies, req.region.as_deref().unwrap_or_default())
        .await?;

    let max_age = (outcome.expires_at - chrono::Utc::now()).num_seconds().max(0);
    let cookie = format!(
        "{TOKEN_NAME}={}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age={max_age}",
        outcome.token
    );

    let response = LoginResponse {
        token: outcome.token,
        expires_at: outcome.expires_at.to_rfc3339(),
        user: UserInfo {
            username: outcome.display_name,
            user_id: outcome.user_id,
            region: outcome.region.to_string(),
        },
    };

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiSuccess::ok("Login successful", response)),
    ))
}

/// GET /api/auth/ping
pub async fn ping() -> Json<ApiSuccess<()>> {
    Json(ApiSuccess {
        status: 200,
        message: "Service is running",
        data: None,
    })
}
