//! Storefront handlers

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use valstore_types::{Region, Storefront};

use crate::error::{ApiError, ApiResult};
use crate::extractors::SessionUser;
use crate::handlers::ApiSuccess;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StoreQuery {
    /// Region override; unknown codes use the session's region
    pub region: Option<String>,
}

impl StoreQuery {
    fn from_extracted(query: Result<Query<Self>, QueryRejection>) -> ApiResult<Self> {
        query
            .map(|Query(query)| query)
            .map_err(|e| ApiError::BadRequest(e.body_text()))
    }

    fn region_or(&self, session_region: Region) -> Region {
        self.region
            .as_deref()
            .map_or(session_region, |code| Region::resolve_or(code, session_region))
    }
}

/// GET /api/store/data
pub async fn store_data(
    State(state): State<AppState>,
    SessionUser { claims }: SessionUser,
    query: Result<Query<StoreQuery>, QueryRejection>,
) -> ApiResult<Json<ApiSuccess<Storefront>>> {
    let region = StoreQuery::from_extracted(query)?.region_or(claims.region);
    let storefront = state
        .auth
        .fetch_storefront(
            &claims.user_id,
            &claims.access_token,
            &claims.entitlement_token,
            region,
        )
        .await?;

    Ok(Json(ApiSuccess::ok("Storefront fetched", storefront)))
}

/// GET /api/store/raw
///
/// Upstream body passed through untouched
pub async fn store_raw(
    State(state): State<AppState>,
    SessionUser { claims }: SessionUser,
    query: Result<Query<StoreQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let region = StoreQuery::from_extracted(query)?.region_or(claims.region);
    let body = state
        .auth
        .fetch_storefront_raw(
            &claims.user_id,
            &claims.access_token,
            &claims.entitlement_token,
            region,
        )
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_override() {
        let query = StoreQuery {
            region: Some("kr".to_string()),
        };
        assert_eq!(query.region_or(Region::Eu), Region::Kr);
    }

    #[test]
    fn test_region_falls_back_to_session() {
        assert_eq!(StoreQuery::default().region_or(Region::Eu), Region::Eu);
        let query = StoreQuery {
            region: Some("mars".to_string()),
        };
        assert_eq!(query.region_or(Region::Na), Region::Na);
    }
}
