//! Axum extractors for session authentication

use axum::extract::{FromRef, FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::header;
use serde::Deserialize;
use valstore_auth_core::SessionClaims;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie and query parameter
pub const TOKEN_NAME: &str = "token";

/// Caller holding a valid session
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub claims: SessionClaims,
}

impl<S> FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_token(parts)?.ok_or(ApiError::MissingToken)?;
        let claims = app_state.auth.validate_and_extract(&token)?;

        Ok(SessionUser { claims })
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Session token from, in order: `Authorization` header, `token` cookie, `token` query parameter.
///
/// A bare `Authorization` value without the `Bearer ` prefix is taken as the token.
fn extract_token(parts: &Parts) -> Result<Option<String>, ApiError> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid Authorization header encoding".into()))?
            .trim();

        let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
        if !token.is_empty() {
            return Ok(Some(token.to_string()));
        }
    }

    for cookie_header in parts.headers.get_all(header::COOKIE) {
        let cookie_str = cookie_header
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid Cookie header encoding".into()))?;

        for cookie in cookie_str.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == TOKEN_NAME && !value.is_empty() {
                    return Ok(Some(value.to_string()));
                }
            }
        }
    }

    let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty());
    Ok(token)
}
