//! Storefront proxy
//!
//! Replays a session's upstream credentials against the region shard's
//! storefront endpoint.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use valstore_types::{Region, Storefront};

use crate::version::ClientVersion;
use crate::{AuthError, UpstreamEndpoints};

/// Fixed platform descriptor expected by the game services (base64 JSON, Windows PC)
pub const CLIENT_PLATFORM: &str = "ew0KCSJwbGF0Zm9ybVR5cGUiOiAiUEMiLA0KCSJwbGF0Zm9ybU9TIjogIldpbmRvd3MiLA0KCSJwbGF0Zm9ybU9TVmVyc2lvbiI6ICIxMC4wLjE5MDQyLjEuMjU2LjY0Yml0IiwNCgkicGxhdGZvcm1DaGlwc2V0IjogIlVua25vd24iDQp9";

const HEADER_CLIENT_PLATFORM: &str = "X-Riot-ClientPlatform";
const HEADER_CLIENT_VERSION: &str = "X-Riot-ClientVersion";
const HEADER_ENTITLEMENTS: &str = "X-Riot-Entitlements-JWT";

/// Upstream credentials for one storefront call
#[derive(Clone, Copy)]
pub struct StorefrontRequest<'a> {
    pub user_id: &'a str,
    pub access_token: &'a str,
    pub entitlement_token: &'a str,
    pub region: Region,
}

impl std::fmt::Debug for StorefrontRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontRequest")
            .field("user_id", &self.user_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Storefront client
#[derive(Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    endpoints: Arc<UpstreamEndpoints>,
    version: ClientVersion,
}

impl StorefrontClient {
    pub fn new(http: reqwest::Client, endpoints: UpstreamEndpoints, version: ClientVersion) -> Self {
        Self {
            http,
            endpoints: Arc::new(endpoints),
            version,
        }
    }

    /// Fetch the storefront body untouched
    pub async fn fetch_raw(&self, request: StorefrontRequest<'_>) -> Result<Bytes, AuthError> {
        let url = self
            .endpoints
            .storefront_url(request.region, request.user_id);
        tracing::debug!(region = %request.region, user_id = %request.user_id, "Requesting storefront");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_CLIENT_PLATFORM, CLIENT_PLATFORM)
            .header(HEADER_CLIENT_VERSION, self.version.current())
            .header(HEADER_ENTITLEMENTS, request.entitlement_token)
            .bearer_auth(request.access_token)
            .body("{}")
            .send()
            .await
            .map_err(|e| AuthError::transport("storefront", e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::transport("storefront", e))?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                region = %request.region,
                body = %String::from_utf8_lossy(&body),
                "Storefront request failed"
            );
            match status {
                StatusCode::NOT_FOUND => tracing::warn!(
                    region = %request.region,
                    "Storefront returned 404: endpoint path changed or wrong region for this account"
                ),
                StatusCode::METHOD_NOT_ALLOWED => {
                    tracing::warn!("Storefront returned 405: request method not allowed")
                }
                _ => {}
            }
            return Err(AuthError::ResourceFetchFailed {
                status: status.as_u16(),
            });
        }

        tracing::debug!(bytes = body.len(), "Storefront fetched");
        Ok(body)
    }

    /// Fetch and decode the storefront
    pub async fn fetch(&self, request: StorefrontRequest<'_>) -> Result<Storefront, AuthError> {
        let body = self.fetch_raw(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "Failed to decode storefront response");
            AuthError::MalformedUpstreamResponse("storefront response")
        })
    }
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("template", &self.endpoints.storefront_url_template)
            .finish_non_exhaustive()
    }
}
