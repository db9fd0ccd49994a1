//! Error types for the Store API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use valstore_auth_core::AuthError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No authentication token provided")]
    MissingToken,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::MissingToken => "MISSING_TOKEN",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Auth(e) => e.error_code(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Auth(e) if e.needs_fresh_cookies() => {
                Some(serde_json::json!({ "needs_fresh_cookies": true }))
            }
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Auth(e) => e.is_internal(),
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Upstream rejections carry a body worth keeping server-side
        if let Self::Auth(AuthError::UpstreamAuthRejected {
            status: upstream_status,
            body: upstream_body,
        }) = &self
        {
            tracing::warn!(upstream_status, body = %upstream_body, "Upstream rejected authorization");
        } else if self.is_internal() {
            tracing::error!(error = %self, code, "API request failed");
        } else {
            tracing::debug!(error = %self, code, "API request rejected");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
