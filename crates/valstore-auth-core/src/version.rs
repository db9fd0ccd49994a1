//! Upstream client version discovery
//!
//! The provider rejects requests without a plausible client version. We ship
//! a known-good fallback and opportunistically replace it with the latest
//! version reported by the discovery endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Per-request timeout for the discovery call
const VERSION_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct VersionResponse {
    status: u16,
    data: Option<VersionData>,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    #[serde(rename = "riotClientVersion", default)]
    riot_client_version: String,
}

/// Errors from a single discovery attempt
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("version request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("version endpoint returned status {0}")]
    Status(u16),

    #[error("version response did not contain a client version")]
    Missing,
}

/// Shared client version cell.
///
/// Single writer (the refresh task), many readers (every upstream request).
/// Clones share the same cell.
#[derive(Clone)]
pub struct ClientVersion {
    tx: Arc<watch::Sender<String>>,
}

impl ClientVersion {
    /// Create a cell holding `fallback` until discovery succeeds
    pub fn new(fallback: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(fallback.into());
        Self { tx: Arc::new(tx) }
    }

    /// Latest committed version
    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Commit a new version
    pub fn set(&self, version: impl Into<String>) {
        self.tx.send_replace(version.into());
    }

    /// Receiver notified on every committed change
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    /// Fetch the latest version once and commit it on success.
    ///
    /// On failure the current value is left untouched.
    pub async fn refresh_once(
        &self,
        http: &reqwest::Client,
        url: &str,
    ) -> Result<String, VersionError> {
        let response = http
            .get(url)
            .header(reqwest::header::USER_AGENT, "valstore")
            .timeout(VERSION_FETCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VersionError::Status(response.status().as_u16()));
        }

        let body: VersionResponse = response.json().await?;
        if body.status != 200 {
            return Err(VersionError::Status(body.status));
        }

        let version = body
            .data
            .map(|d| d.riot_client_version)
            .filter(|v| !v.is_empty())
            .ok_or(VersionError::Missing)?;

        self.set(version.clone());
        Ok(version)
    }

    /// Refresh in the background: once immediately, then every `interval` if given.
    pub fn spawn_refresh(
        &self,
        http: reqwest::Client,
        url: String,
        interval: Option<Duration>,
    ) -> JoinHandle<()> {
        let version = self.clone();
        tokio::spawn(async move {
            version.refresh_logged(&http, &url).await;

            let Some(period) = interval else {
                return;
            };
            let mut ticker = tokio::time::interval(period);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                version.refresh_logged(&http, &url).await;
            }
        })
    }

    async fn refresh_logged(&self, http: &reqwest::Client, url: &str) {
        match self.refresh_once(http, url).await {
            Ok(version) => tracing::info!(%version, "Client version refreshed"),
            Err(e) => tracing::warn!(
                error = %e,
                fallback = %self.current(),
                "Could not fetch latest client version, keeping current value"
            ),
        }
    }
}

impl std::fmt::Debug for ClientVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClientVersion").field(&self.current()).finish()
    }
}
