//! Auth errors

use thiserror::Error;

/// Errors raised by the login pipeline, the session gate and the storefront proxy.
///
/// `Display` output is safe to return to callers: it never contains upstream
/// response bodies, cookie values or tokens.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Cookie string parsed (or filtered) to nothing
    #[error("no cookies provided")]
    NoCookiesProvided,

    /// Provider redirected to its login page: the captured cookies aged out
    #[error("cookies expired or invalid")]
    CookiesExpiredOrInvalid,

    /// Authorize endpoint answered without a redirect
    #[error("upstream rejected authorization (status {status})")]
    UpstreamAuthRejected {
        status: u16,
        /// Upstream body, kept for server-side diagnostics only
        body: String,
    },

    /// Upstream answered with a shape we cannot use
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(&'static str),

    /// Redirect did not carry an access token
    #[error("access token extraction failed")]
    TokenExtractionFailed,

    /// Entitlement endpoint returned non-2xx
    #[error("entitlement fetch failed (status {status})")]
    EntitlementFetchFailed { status: u16 },

    /// Userinfo endpoint returned non-2xx
    #[error("profile fetch failed (status {status})")]
    ProfileFetchFailed { status: u16 },

    /// Upstream did not answer within the configured timeout
    #[error("upstream timeout during {operation}")]
    UpstreamTimeout { operation: &'static str },

    /// Connection-level failure talking to the upstream
    #[error("upstream unavailable during {operation}")]
    UpstreamUnavailable { operation: &'static str },

    /// Session token could not be signed
    #[error("token signing failed: {0}")]
    TokenSigningFailed(String),

    /// Signature mismatch or unexpected algorithm
    #[error("invalid token")]
    InvalidToken,

    /// Session token is past its expiry
    #[error("token expired")]
    TokenExpired,

    /// Session token could not be decoded
    #[error("malformed token")]
    MalformedToken,

    /// Storefront endpoint returned non-2xx
    #[error("resource fetch failed (status {status})")]
    ResourceFetchFailed { status: u16 },

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoCookiesProvided => 400,
            Self::CookiesExpiredOrInvalid
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::MalformedToken => 401,
            Self::UpstreamAuthRejected { .. }
            | Self::MalformedUpstreamResponse(_)
            | Self::TokenExtractionFailed
            | Self::EntitlementFetchFailed { .. }
            | Self::ProfileFetchFailed { .. }
            | Self::UpstreamUnavailable { .. }
            | Self::ResourceFetchFailed { .. } => 502,
            Self::UpstreamTimeout { .. } => 504,
            Self::TokenSigningFailed(_) | Self::Configuration(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoCookiesProvided => "NO_COOKIES",
            Self::CookiesExpiredOrInvalid => "COOKIES_EXPIRED",
            Self::UpstreamAuthRejected { .. } => "UPSTREAM_AUTH_REJECTED",
            Self::MalformedUpstreamResponse(_) => "MALFORMED_UPSTREAM_RESPONSE",
            Self::TokenExtractionFailed => "TOKEN_EXTRACTION_FAILED",
            Self::EntitlementFetchFailed { .. } => "ENTITLEMENT_FETCH_FAILED",
            Self::ProfileFetchFailed { .. } => "PROFILE_FETCH_FAILED",
            Self::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            Self::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            Self::TokenSigningFailed(_) => "TOKEN_SIGNING_FAILED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::ResourceFetchFailed { .. } => "RESOURCE_FETCH_FAILED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether the caller should be asked for fresh cookies
    pub fn needs_fresh_cookies(&self) -> bool {
        matches!(self, Self::CookiesExpiredOrInvalid | Self::NoCookiesProvided)
    }

    /// Whether the failure is on the server side and worth logging at error level
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Map a transport error from `operation` into the timeout/unavailable pair
    pub(crate) fn transport(operation: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::warn!(operation, "Upstream request timed out");
            Self::UpstreamTimeout { operation }
        } else {
            tracing::warn!(operation, error = %err.without_url(), "Upstream request failed");
            Self::UpstreamUnavailable { operation }
        }
    }
}
