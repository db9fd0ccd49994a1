//! Upstream identity exchange
//!
//! Turns a captured browser cookie set into upstream credentials in three
//! strictly ordered steps: authorize (cookies -> access token), entitlement
//! (access token -> entitlement token) and profile (access token -> display
//! identity). No step is retried; the first failure ends the login.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE, COOKIE, LOCATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use valstore_types::Region;

use crate::cookies::CookieSet;
use crate::crypto::fingerprint;
use crate::redirect::access_token_from_location;
use crate::transport;
use crate::version::ClientVersion;
use crate::{AuthConfig, AuthError, UpstreamEndpoints};

/// Progress of a single login call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Unauthenticated,
    CookiesFiltered,
    Authorized,
    Entitled,
    Profiled,
    SessionIssued,
}

impl std::fmt::Display for LoginStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::CookiesFiltered => "cookies_filtered",
            Self::Authorized => "authorized",
            Self::Entitled => "entitled",
            Self::Profiled => "profiled",
            Self::SessionIssued => "session_issued",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful upstream authentication
#[derive(Clone)]
pub struct IdentityResult {
    /// Upstream subject id
    pub user_id: String,
    /// Account email, when the provider shares it
    pub email: Option<String>,
    /// Bearer token from the authorize redirect
    pub access_token: String,
    /// Entitlement token for resource calls
    pub entitlement_token: String,
    /// In-game display name
    pub display_name: String,
    /// In-game tag (the part after `#`)
    pub display_tag: String,
    /// Shard the user's resources live on
    pub region: Region,
}

impl IdentityResult {
    /// `name#tag`, or just `name` without a tag
    pub fn formatted_name(&self) -> String {
        if self.display_tag.is_empty() {
            self.display_name.clone()
        } else {
            format!("{}#{}", self.display_name, self.display_tag)
        }
    }
}

impl std::fmt::Debug for IdentityResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResult")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("display_tag", &self.display_tag)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct EntitlementResponse {
    #[serde(rename = "entitlements_token", default)]
    entitlement_token: String,
}

/// Userinfo payload
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub acct: Option<AccountInfo>,
}

/// Nested game account block of the userinfo payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub tag_line: String,
}

impl UserInfo {
    /// Display name and tag; the nested account block wins when it names the player.
    pub fn display_identity(&self) -> (String, String) {
        match &self.acct {
            Some(acct) if !acct.game_name.is_empty() => {
                (acct.game_name.clone(), acct.tag_line.clone())
            }
            _ => (
                self.name.clone().unwrap_or_default(),
                self.tag.clone().unwrap_or_default(),
            ),
        }
    }
}

/// Client for the three-step identity exchange.
///
/// Holds only immutable state plus the shared [`ClientVersion`] reader, so a
/// single instance serves concurrent logins.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    endpoints: Arc<UpstreamEndpoints>,
    essential_cookies: Arc<[String]>,
    version: ClientVersion,
    connect_timeout: Duration,
    authorize_timeout: Duration,
}

impl IdentityClient {
    /// Create a new identity client
    pub fn new(config: &AuthConfig, version: ClientVersion) -> Result<Self, AuthError> {
        Ok(Self::with_client(config, version, transport::pooled_client(config)?))
    }

    /// Create a client with a caller-provided pooled HTTP client
    pub fn with_client(config: &AuthConfig, version: ClientVersion, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoints: Arc::new(config.endpoints.clone()),
            essential_cookies: config.essential_cookies.clone().into(),
            version,
            connect_timeout: config.connect_timeout,
            authorize_timeout: config.authorize_timeout,
        }
    }

    /// Run the full exchange for `cookies`, tagging the result with `region`
    pub async fn authenticate(
        &self,
        cookies: &CookieSet,
        region: Region,
    ) -> Result<IdentityResult, AuthError> {
        let essential = cookies.filter_with(&self.essential_cookies[..]);
        if essential.is_empty() {
            return Err(AuthError::NoCookiesProvided);
        }
        tracing::debug!(
            stage = %LoginStage::CookiesFiltered,
            cookie_names = ?essential.names().collect::<Vec<_>>(),
            %region,
            "Starting cookie authentication"
        );

        let access_token = self.authorize(&essential).await?;
        tracing::debug!(
            stage = %LoginStage::Authorized,
            token_fp = %fingerprint(&access_token),
            "Access token obtained"
        );

        let entitlement_token = self.entitlement_token(&access_token).await?;
        tracing::debug!(stage = %LoginStage::Entitled, "Entitlement token obtained");

        let info = self.user_info(&access_token).await?;
        let (display_name, display_tag) = info.display_identity();
        tracing::debug!(stage = %LoginStage::Profiled, user_id = %info.sub, "Profile fetched");

        Ok(IdentityResult {
            user_id: info.sub,
            email: info.email,
            access_token,
            entitlement_token,
            display_name,
            display_tag,
            region,
        })
    }

    /// Exchange cookies for an access token via the implicit-flow redirect
    pub async fn authorize(&self, cookies: &CookieSet) -> Result<String, AuthError> {
        let cookie_header = HeaderValue::from_str(&cookies.header_value()).map_err(|_| {
            tracing::debug!("Cookie header contains characters that cannot be sent");
            AuthError::NoCookiesProvided
        })?;

        let client = transport::authorize_client(self.connect_timeout, self.authorize_timeout)?;
        let response = client
            .get(&self.endpoints.authorize_url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, self.user_agent())
            .header(COOKIE, cookie_header)
            .send()
            .await
            .map_err(|e| AuthError::transport("authorize", e))?;

        let status = response.status();
        if status != StatusCode::FOUND && status != StatusCode::SEE_OTHER {
            let body = transport::read_capped(response, transport::MAX_DIAGNOSTIC_BODY).await;
            tracing::warn!(status = status.as_u16(), "Authorize endpoint did not redirect");
            return Err(AuthError::UpstreamAuthRejected {
                status: status.as_u16(),
                body,
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MalformedUpstreamResponse(
                "authorize redirect without Location",
            ))?;

        access_token_from_location(location).inspect_err(|e| {
            tracing::debug!(error = %e, "Authorize redirect rejected");
        })
    }

    /// Fetch the entitlement token for an access token
    pub async fn entitlement_token(&self, access_token: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .post(&self.endpoints.entitlements_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::transport("entitlement", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status, "Entitlement endpoint returned an error");
            return Err(AuthError::EntitlementFetchFailed { status });
        }

        let body: EntitlementResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to decode entitlement response");
            AuthError::MalformedUpstreamResponse("entitlement response")
        })?;

        if body.entitlement_token.is_empty() {
            return Err(AuthError::MalformedUpstreamResponse(
                "entitlement response without token",
            ));
        }
        Ok(body.entitlement_token)
    }

    /// Fetch the userinfo document for an access token
    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::transport("profile", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status, "Userinfo endpoint returned an error");
            return Err(AuthError::ProfileFetchFailed { status });
        }

        response.json::<UserInfo>().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to decode userinfo response");
            AuthError::MalformedUpstreamResponse("userinfo response")
        })
    }

    /// Pooled HTTP client, shared with the version refresher
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    fn user_agent(&self) -> String {
        format!("RiotClient/{}", self.version.current())
    }
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClient")
            .field("endpoints", &self.endpoints)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
