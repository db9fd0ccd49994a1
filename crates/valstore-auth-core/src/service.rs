//! Auth service - ties together cookie login, session signing and the storefront proxy

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use valstore_types::{Region, Storefront};

use crate::{
    config::AuthConfig,
    cookies::CookieSet,
    identity::{IdentityClient, LoginStage},
    session::{SessionClaims, SessionIssuer},
    storefront::{StorefrontClient, StorefrontRequest},
    version::ClientVersion,
    AuthError,
};

/// Result of a successful cookie login
#[derive(Clone)]
pub struct LoginOutcome {
    /// Signed session token
    pub token: String,
    /// `name#tag` display name
    pub display_name: String,
    /// Upstream subject id
    pub user_id: String,
    /// Session expiry
    pub expires_at: DateTime<Utc>,
    /// Region bound to the session
    pub region: Region,
}

impl std::fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginOutcome")
            .field("display_name", &self.display_name)
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Cookie login (cookies -> upstream credentials -> signed session)
/// - Session validation
/// - Storefront retrieval with session credentials
///
/// All methods take `&self`; one instance serves every request.
pub struct AuthService {
    config: AuthConfig,
    version: ClientVersion,
    identity: IdentityClient,
    sessions: SessionIssuer,
    storefront: StorefrontClient,
}

impl AuthService {
    /// Create a new auth service.
    ///
    /// Fails when the session secret is unusable or the HTTP client cannot be
    /// built. Does not touch the network; call [`AuthService::spawn_version_refresh`]
    /// to start client version discovery.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let sessions = SessionIssuer::new(&config.session_secret, config.session_duration)?;
        let version = ClientVersion::new(config.fallback_client_version.clone());
        let identity = IdentityClient::new(&config, version.clone())?;
        let storefront = StorefrontClient::new(
            identity.http_client().clone(),
            config.endpoints.clone(),
            version.clone(),
        );

        Ok(Self {
            config,
            version,
            identity,
            sessions,
            storefront,
        })
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Exchange a raw browser cookie string for a signed session.
    ///
    /// Unknown or missing region codes fall back to the configured default.
    pub async fn login(&self, raw_cookies: &str, region_code: &str) -> Result<LoginOutcome, AuthError> {
        let region = Region::resolve_or(region_code, self.config.default_region);
        tracing::debug!(stage = %LoginStage::Unauthenticated, %region, "Cookie login started");

        let cookies = CookieSet::parse(raw_cookies);
        if cookies.is_empty() {
            tracing::debug!("Cookie string parsed to nothing");
            return Err(AuthError::NoCookiesProvided);
        }

        let identity = self.identity.authenticate(&cookies, region).await?;
        let issued = self.sessions.issue(&identity)?;
        tracing::info!(
            stage = %LoginStage::SessionIssued,
            user_id = %identity.user_id,
            %region,
            "Cookie login succeeded"
        );

        Ok(LoginOutcome {
            token: issued.token,
            display_name: issued.claims.display_name,
            user_id: issued.claims.user_id,
            expires_at: issued.expires_at,
            region,
        })
    }

    // =========================================================================
    // Session Validation
    // =========================================================================

    /// Validate a signed session token and return its claims
    pub fn validate_and_extract(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.sessions.validate(token)
    }

    // =========================================================================
    // Storefront
    // =========================================================================

    /// Fetch the raw storefront body
    pub async fn fetch_storefront_raw(
        &self,
        user_id: &str,
        access_token: &str,
        entitlement_token: &str,
        region: Region,
    ) -> Result<Bytes, AuthError> {
        self.storefront
            .fetch_raw(StorefrontRequest {
                user_id,
                access_token,
                entitlement_token,
                region,
            })
            .await
    }

    /// Fetch and decode the storefront
    pub async fn fetch_storefront(
        &self,
        user_id: &str,
        access_token: &str,
        entitlement_token: &str,
        region: Region,
    ) -> Result<Storefront, AuthError> {
        self.storefront
            .fetch(StorefrontRequest {
                user_id,
                access_token,
                entitlement_token,
                region,
            })
            .await
    }

    // =========================================================================
    // Client Version
    // =========================================================================

    /// Start client version discovery in the background.
    ///
    /// Runs once immediately, then on the configured interval if any. Must be
    /// called from within a tokio runtime.
    pub fn spawn_version_refresh(&self) -> JoinHandle<()> {
        self.version.spawn_refresh(
            self.identity.http_client().clone(),
            self.config.endpoints.version_url.clone(),
            self.config.version_refresh_interval,
        )
    }

    /// Shared client version cell
    pub fn client_version(&self) -> &ClientVersion {
        &self.version
    }

    /// Region used when a caller gives none
    pub fn default_region(&self) -> Region {
        self.config.default_region
    }

    /// Active configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
