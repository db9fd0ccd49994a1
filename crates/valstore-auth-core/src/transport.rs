//! HTTP client construction for upstream calls

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::tls::Version;

use crate::{AuthConfig, AuthError};

/// Upper bound on upstream error bodies kept for diagnostics
pub const MAX_DIAGNOSTIC_BODY: usize = 4096;

/// Long-lived pooled client for entitlement, profile, storefront and version calls.
///
/// Never mutated after construction, so it is safe to share across
/// concurrent logins.
pub fn pooled_client(config: &AuthConfig) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .min_tls_version(Version::TLS_1_2)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .tcp_keepalive(Duration::from_secs(30))
        .build()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build upstream HTTP client");
            AuthError::Configuration("failed to build upstream HTTP client".to_string())
        })
}

/// One-shot client for the authorize step.
///
/// Built per call: fresh empty cookie jar and redirects disabled so the
/// `Location` of the token redirect can be inspected. Nothing is shared with
/// other in-flight logins.
pub fn authorize_client(connect: Duration, timeout: Duration) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .min_tls_version(Version::TLS_1_2)
        .cookie_provider(Arc::new(reqwest::cookie::Jar::default()))
        .redirect(Policy::none())
        .connect_timeout(connect)
        .timeout(timeout)
        .build()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build authorize HTTP client");
            AuthError::Configuration("failed to build authorize HTTP client".to_string())
        })
}

/// Read at most `cap` bytes of a response body, lossily decoded.
///
/// Stops pulling chunks once the cap is reached; read errors end the body early.
pub async fn read_capped(mut response: reqwest::Response, cap: usize) -> String {
    let mut buf = Vec::new();
    while buf.len() < cap {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e.without_url(), "Upstream body read ended early");
                break;
            }
        }
    }
    buf.truncate(cap);
    String::from_utf8_lossy(&buf).into_owned()
}
