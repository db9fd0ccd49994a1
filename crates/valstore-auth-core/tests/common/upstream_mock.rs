//! Mock upstream for integration testing
//!
//! Provides wiremock-based authorize, entitlement, userinfo, version and
//! storefront endpoints on a single local server.

use serde_json::json;
use valstore_auth_core::{AuthConfig, UpstreamEndpoints};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Signing secret used by every test config
pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Mock upstream server
pub struct UpstreamMock {
    server: MockServer,
}

impl UpstreamMock {
    /// Start an empty mock upstream
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Underlying wiremock server, for custom mocks
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Base URL of the mock server (without trailing slash)
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Endpoints pointing at this server
    pub fn endpoints(&self) -> UpstreamEndpoints {
        let base = self.url();
        UpstreamEndpoints {
            authorize_url: format!("{base}/authorize?client_id=test-client&response_type=token"),
            entitlements_url: format!("{base}/api/token/v1"),
            userinfo_url: format!("{base}/userinfo"),
            version_url: format!("{base}/v1/version"),
            storefront_url_template: format!("{base}/store/{{region}}/storefront/{{user_id}}"),
        }
    }

    /// Auth config pointing at this server
    pub fn config(&self) -> AuthConfig {
        AuthConfig::new(TEST_SECRET).with_endpoints(self.endpoints())
    }

    /// Authorize answers 302 with `location`
    #[allow(dead_code)]
    pub async fn mount_authorize_redirect(&self, location: &str) {
        Mock::given(method("GET"))
            .and(path("/authorize"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", location))
            .mount(&self.server)
            .await;
    }

    /// Authorize answers 302 with an access token in the fragment
    #[allow(dead_code)]
    pub async fn mount_authorize_token(&self, access_token: &str) {
        self.mount_authorize_redirect(&format!(
            "https://playvalorant.com/opt_in#access_token={access_token}&scope=account%20openid&token_type=Bearer&expires_in=3600"
        ))
        .await;
    }

    /// Entitlement endpoint returns `token`
    #[allow(dead_code)]
    pub async fn mount_entitlements(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/token/v1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "entitlements_token": token })),
            )
            .mount(&self.server)
            .await;
    }

    /// Userinfo endpoint returns a player with a nested game account
    #[allow(dead_code)]
    pub async fn mount_userinfo(&self, sub: &str, game_name: &str, tag_line: &str) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": sub,
                "email": "player@example.com",
                "acct": { "game_name": game_name, "tag_line": tag_line }
            })))
            .mount(&self.server)
            .await;
    }

    /// Version endpoint returns `version`
    #[allow(dead_code)]
    pub async fn mount_version(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "data": { "riotClientVersion": version, "branch": "release-test" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Happy-path login: token redirect, entitlement and profile
    #[allow(dead_code)]
    pub async fn mount_login_flow(&self) {
        self.mount_authorize_token("ACCESS-TOKEN").await;
        self.mount_entitlements("ENTITLEMENT-TOKEN").await;
        self.mount_userinfo("puuid-1", "Player", "EUW").await;
    }
}

/// A small but complete storefront payload
#[allow(dead_code)]
pub fn storefront_body() -> serde_json::Value {
    json!({
        "FeaturedBundle": {
            "Bundle": {
                "ID": "bundle-1",
                "DataAssetID": "asset-1",
                "CurrencyID": "vp",
                "Items": [],
                "DurationRemainingInSeconds": 3600,
                "WholesaleOnly": false
            },
            "Bundles": [],
            "BundleRemainingDurationInSeconds": 3600
        },
        "SkinsPanelLayout": {
            "SingleItemOffers": ["skin-a", "skin-b", "skin-c", "skin-d"],
            "SingleItemStoreOffers": [],
            "SingleItemOffersRemainingDurationInSeconds": 7200
        },
        "UpgradeCurrencyStore": { "UpgradeCurrencyOffers": [] },
        "AccessoryStore": {
            "AccessoryStoreOffers": [],
            "AccessoryStoreRemainingDurationInSeconds": 0,
            "StorefrontID": "sf-1"
        }
    })
}
