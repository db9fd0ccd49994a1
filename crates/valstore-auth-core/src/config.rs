//! Configuration types for the auth core

use std::time::Duration;

use valstore_types::Region;

use crate::cookies::ESSENTIAL_COOKIES;

/// Development-only signing secret; see [`AuthConfig::insecure_development`].
pub const DEV_SESSION_SECRET: &str = "val-store-server-secret-key-development-only";

/// Known-good client version used until (or unless) discovery succeeds
pub const FALLBACK_CLIENT_VERSION: &str = "release-10.07-shipping-6-3399868";

/// Upstream endpoints
#[derive(Debug, Clone)]
pub struct UpstreamEndpoints {
    /// Implicit-flow authorize URL (cookies in, redirect out)
    pub authorize_url: String,
    /// Entitlement token endpoint
    pub entitlements_url: String,
    /// Userinfo endpoint
    pub userinfo_url: String,
    /// Client version discovery endpoint
    pub version_url: String,
    /// Storefront URL with `{region}` and `{user_id}` placeholders
    pub storefront_url_template: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: "https://auth.riotgames.com/authorize?redirect_uri=https%3A%2F%2Fplayvalorant.com%2Fopt_in&client_id=play-valorant-web-prod&response_type=token%20id_token&scope=account%20openid&nonce=1".to_string(),
            entitlements_url: "https://entitlements.auth.riotgames.com/api/token/v1".to_string(),
            userinfo_url: "https://auth.riotgames.com/userinfo".to_string(),
            version_url: "https://valorant-api.com/v1/version".to_string(),
            storefront_url_template: "https://pd.{region}.a.pvp.net/store/v3/storefront/{user_id}"
                .to_string(),
        }
    }
}

impl UpstreamEndpoints {
    /// Storefront URL for a user on a region shard
    pub fn storefront_url(&self, region: Region, user_id: &str) -> String {
        self.storefront_url_template
            .replace("{region}", region.as_str())
            .replace("{user_id}", user_id)
    }
}

/// Auth core configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for session signing
    pub session_secret: String,
    /// Session lifetime
    pub session_duration: Duration,
    /// Region used when the caller supplies none or an unknown code
    pub default_region: Region,
    /// Upstream URLs
    pub endpoints: UpstreamEndpoints,
    /// Client version sent until discovery succeeds
    pub fallback_client_version: String,
    /// Re-run version discovery on this period (None = once at startup)
    pub version_refresh_interval: Option<Duration>,
    /// TCP connect timeout for every upstream call
    pub connect_timeout: Duration,
    /// Whole-request timeout for the authorize step
    pub authorize_timeout: Duration,
    /// Whole-request timeout for entitlement, profile and storefront calls
    pub request_timeout: Duration,
    /// Cookie allow-list for the authorize step
    pub essential_cookies: Vec<String>,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(session_secret: impl Into<String>) -> Self {
        Self {
            session_secret: session_secret.into(),
            session_duration: Duration::from_secs(24 * 60 * 60), // 24 hours
            default_region: Region::Ap,
            endpoints: UpstreamEndpoints::default(),
            fallback_client_version: FALLBACK_CLIENT_VERSION.to_string(),
            version_refresh_interval: None,
            connect_timeout: Duration::from_secs(30),
            authorize_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            essential_cookies: ESSENTIAL_COOKIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Config signed with [`DEV_SESSION_SECRET`]. Never use outside local development.
    pub fn insecure_development() -> Self {
        tracing::warn!("Using the insecure development session secret");
        Self::new(DEV_SESSION_SECRET)
    }

    /// Set session duration
    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    /// Set default region
    pub fn with_default_region(mut self, region: Region) -> Self {
        self.default_region = region;
        self
    }

    /// Override upstream endpoints
    pub fn with_endpoints(mut self, endpoints: UpstreamEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override the fallback client version
    pub fn with_fallback_client_version(mut self, version: impl Into<String>) -> Self {
        self.fallback_client_version = version.into();
        self
    }

    /// Refresh the client version periodically
    pub fn with_version_refresh_interval(mut self, interval: Duration) -> Self {
        self.version_refresh_interval = Some(interval);
        self
    }

    /// Set upstream timeouts
    pub fn with_timeouts(mut self, connect: Duration, authorize: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.authorize_timeout = authorize;
        self.request_timeout = request;
        self
    }

    /// Longest a login can spend waiting on upstream: authorize, then
    /// entitlement and profile. Storefront calls take a single request timeout.
    pub fn upstream_budget(&self) -> Duration {
        self.authorize_timeout + self.request_timeout * 2
    }

    /// Replace the essential cookie allow-list
    pub fn with_essential_cookies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.essential_cookies = names.into_iter().map(Into::into).collect();
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret_len", &self.session_secret.len())
            .field("session_duration", &self.session_duration)
            .field("default_region", &self.default_region)
            .field("endpoints", &self.endpoints)
            .field("fallback_client_version", &self.fallback_client_version)
            .field("version_refresh_interval", &self.version_refresh_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("s".repeat(32));
        assert_eq!(config.session_duration, Duration::from_secs(86_400));
        assert_eq!(config.default_region, Region::Ap);
        assert_eq!(config.fallback_client_version, FALLBACK_CLIENT_VERSION);
        assert!(config.essential_cookies.iter().any(|c| c == "ssid"));
    }

    #[test]
    fn test_upstream_budget_covers_login() {
        let config = AuthConfig::new("s".repeat(32));
        assert_eq!(config.upstream_budget(), Duration::from_secs(150));

        let tight = config.with_timeouts(
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3),
        );
        assert_eq!(tight.upstream_budget(), Duration::from_secs(8));
    }

    #[test]
    fn test_storefront_url() {
        let endpoints = UpstreamEndpoints::default();
        assert_eq!(
            endpoints.storefront_url(Region::Eu, "puuid-1"),
            "https://pd.eu.a.pvp.net/store/v3/storefront/puuid-1"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = AuthConfig::new("topsecretvalue-topsecretvalue-xx");
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecretvalue"));
    }
}
