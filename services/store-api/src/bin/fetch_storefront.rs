//! One-shot storefront fetch
//!
//! Logs in with a cookie string and prints the raw storefront, without
//! running the HTTP server.
//!
//! ## Environment
//!
//! - `STORE_COOKIES` - Browser cookie string (required)
//! - `STORE_REGION` - Region code (default `ap`)
//! - `STORE_OUTPUT` - Write to this file instead of stdout (optional)
//! - `RUST_LOG` - Log filter (logs go to stderr)

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use valstore_auth_core::{AuthConfig, AuthService, CookieSet, ESSENTIAL_COOKIES};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging (stderr only - stdout carries the storefront)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cookies = std::env::var("STORE_COOKIES")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .context("STORE_COOKIES is required, e.g. STORE_COOKIES=\"ssid=...; clid=...\"")?;
    let region = std::env::var("STORE_REGION").unwrap_or_else(|_| "ap".to_string());
    let output = std::env::var("STORE_OUTPUT").ok().filter(|o| !o.is_empty());

    report_cookies(&CookieSet::parse(&cookies));

    // The session never leaves this process
    let config = match std::env::var("SESSION_SECRET") {
        Ok(secret) if secret.len() >= 32 => AuthConfig::new(secret),
        _ => AuthConfig::insecure_development(),
    };
    let auth = AuthService::new(config).context("failed to initialize auth service")?;
    auth.spawn_version_refresh()
        .await
        .context("client version refresh task failed")?;

    let outcome = auth
        .login(&cookies, &region)
        .await
        .context("cookie login failed")?;
    tracing::info!(
        user = %outcome.display_name,
        user_id = %outcome.user_id,
        region = %outcome.region,
        "Authenticated"
    );

    let claims = auth.validate_and_extract(&outcome.token)?;
    let raw = auth
        .fetch_storefront_raw(
            &claims.user_id,
            &claims.access_token,
            &claims.entitlement_token,
            claims.region,
        )
        .await
        .context("storefront fetch failed")?;

    let value: serde_json::Value =
        serde_json::from_slice(&raw).context("storefront response is not valid JSON")?;
    let pretty = serde_json::to_string_pretty(&value)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, pretty)
                .await
                .with_context(|| format!("failed to write {path}"))?;
            tracing::info!(%path, "Storefront saved");
        }
        None => println!("{pretty}"),
    }

    Ok(())
}

/// Which essential cookies are present; values are never printed.
fn report_cookies(cookies: &CookieSet) {
    for name in ESSENTIAL_COOKIES {
        if cookies.contains(*name) {
            tracing::debug!(cookie = *name, "present");
        } else {
            tracing::debug!(cookie = *name, "missing");
        }
    }
    tracing::debug!(total = cookies.len(), "Cookies parsed");
}
