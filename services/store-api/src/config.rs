//! Configuration for the Store API service.

use std::time::Duration;

use valstore_auth_core::{AuthConfig, UpstreamEndpoints, DEV_SESSION_SECRET};
use valstore_types::Region;

/// Headroom between the upstream timeout budget and the route timeout
const ROUTE_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Store API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Whole-request timeout for API routes
    pub request_timeout: Duration,

    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,

    /// Requests slower than this are logged at warn
    pub slow_request_threshold: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        let http_port = match lookup("HTTP_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?,
            None => 8080,
        };

        // Session secret (minimum 32 bytes unless the dev secret is opted into)
        let allow_dev_secret = parse_or(&lookup, "ALLOW_INSECURE_DEV_SECRET", false)?;
        let auth = match lookup("SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if secret.len() < 32 => {
                return Err(ConfigError::Invalid(
                    "SESSION_SECRET must be at least 32 characters",
                ));
            }
            Some(secret) => AuthConfig::new(secret),
            None if allow_dev_secret => AuthConfig::insecure_development(),
            None => return Err(ConfigError::Missing("SESSION_SECRET")),
        };

        // Session duration (default 24 hours)
        let session_duration_hours: u64 = parse_or(&lookup, "SESSION_DURATION_HOURS", 24)?;
        if session_duration_hours == 0 {
            return Err(ConfigError::Invalid("SESSION_DURATION_HOURS"));
        }

        // Default region: strict here so typos surface at startup
        let default_region: Region = match lookup("DEFAULT_REGION") {
            Some(code) => code
                .parse()
                .map_err(|_| ConfigError::Invalid("DEFAULT_REGION"))?,
            None => Region::default(),
        };

        // Route timeout must outlast every upstream timeout so those surface first
        let upstream_budget = auth.upstream_budget();
        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;
                let timeout = Duration::from_secs(secs);
                if timeout <= upstream_budget {
                    return Err(ConfigError::Invalid(
                        "REQUEST_TIMEOUT_SECS must exceed the upstream timeout budget",
                    ));
                }
                timeout
            }
            None => upstream_budget + ROUTE_TIMEOUT_MARGIN,
        };

        let slow_request_ms: u64 = parse_or(&lookup, "SLOW_REQUEST_THRESHOLD_MS", 5000)?;

        // CORS (credentialed, so no wildcard)
        let allowed_origins: Vec<String> = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if allowed_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::Invalid("ALLOWED_ORIGINS"));
        }

        // Upstream
        let mut endpoints = UpstreamEndpoints::default();
        override_from(&lookup, "UPSTREAM_AUTHORIZE_URL", &mut endpoints.authorize_url);
        override_from(&lookup, "UPSTREAM_ENTITLEMENTS_URL", &mut endpoints.entitlements_url);
        override_from(&lookup, "UPSTREAM_USERINFO_URL", &mut endpoints.userinfo_url);
        override_from(&lookup, "UPSTREAM_VERSION_URL", &mut endpoints.version_url);
        override_from(
            &lookup,
            "UPSTREAM_STOREFRONT_URL_TEMPLATE",
            &mut endpoints.storefront_url_template,
        );

        let mut auth = auth
            .with_session_duration(Duration::from_secs(session_duration_hours * 3600))
            .with_default_region(default_region)
            .with_endpoints(endpoints);

        if let Some(version) = lookup("CLIENT_VERSION_FALLBACK").filter(|v| !v.is_empty()) {
            auth = auth.with_fallback_client_version(version);
        }

        if let Some(raw) = lookup("VERSION_REFRESH_INTERVAL_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::Invalid("VERSION_REFRESH_INTERVAL_SECS"))?;
            if secs > 0 {
                auth = auth.with_version_refresh_interval(Duration::from_secs(secs));
            }
        }

        Ok(Self {
            http_port,
            auth,
            request_timeout,
            allowed_origins,
            slow_request_threshold: Duration::from_millis(slow_request_ms),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn override_from<F>(lookup: &F, key: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
        *target = value;
    }
}

/// Whether the configured secret is the development one
pub fn uses_dev_secret(config: &Config) -> bool {
    config.auth.session_secret == DEV_SESSION_SECRET
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
