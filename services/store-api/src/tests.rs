//! Router tests against a mocked upstream

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use valstore_auth_core::{AuthConfig, AuthService, UpstreamEndpoints, FALLBACK_CLIENT_VERSION};
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const SECRET: &str = "router-test-secret-with-at-least-32-bytes";

// ============================================================================
// Helpers
// ============================================================================

fn endpoints(base: &str) -> UpstreamEndpoints {
    UpstreamEndpoints {
        authorize_url: format!("{base}/authorize"),
        entitlements_url: format!("{base}/api/token/v1"),
        userinfo_url: format!("{base}/userinfo"),
        version_url: format!("{base}/v1/version"),
        storefront_url_template: format!("{base}/store/{{region}}/storefront/{{user_id}}"),
    }
}

fn app(upstream: &MockServer) -> Router {
    let auth = AuthConfig::new(SECRET).with_endpoints(endpoints(&upstream.uri()));
    app_with(auth, Duration::from_secs(10))
}

fn app_with(auth: AuthConfig, request_timeout: Duration) -> Router {
    let config = Config {
        http_port: 0,
        auth: auth.clone(),
        request_timeout,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        slow_request_threshold: Duration::from_secs(5),
    };
    build_router(AppState::new(AuthService::new(auth).unwrap(), config))
}

async fn mount_login_flow(upstream: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/authorize"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            "https://playvalorant.com/opt_in#access_token=ACCESS&scope=account",
        ))
        .mount(upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "entitlements_token": "ENT" })))
        .mount(upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "puuid-1",
            "acct": { "game_name": "Player", "tag_line": "EUW" }
        })))
        .mount(upstream)
        .await;
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login/cookies")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(login_request(json!({ "cookies": "ssid=a; clid=b", "region": "eu" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let upstream = MockServer::start().await;
    let app = app(&upstream);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["client_version"], FALLBACK_CLIENT_VERSION);
    assert_eq!(body["default_region"], "ap");

    let response = app.oneshot(get("/api/auth/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], 200);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_returns_token_and_cookie() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;
    let app = app(&upstream);

    let response = app
        .oneshot(login_request(json!({ "cookies": "ssid=a; clid=b", "region": "eu" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));

    let body = json_body(response).await;
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["user"]["username"], "Player#EUW");
    assert_eq!(body["data"]["user"]["user_id"], "puuid-1");
    assert_eq!(body["data"]["user"]["region"], "eu");
    assert!(set_cookie.contains(body["data"]["token"].as_str().unwrap()));
}

#[tokio::test]
async fn test_login_with_invalid_json() {
    let upstream = MockServer::start().await;
    let response = app(&upstream)
        .oneshot(login_request(json!({ "region": "eu" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_with_empty_cookies() {
    let upstream = MockServer::start().await;
    let response = app(&upstream)
        .oneshot(login_request(json!({ "cookies": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "NO_COOKIES");
}

#[tokio::test]
async fn test_login_with_expired_cookies() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authorize"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "https://authenticate.example.com/login"),
        )
        .mount(&upstream)
        .await;

    let response = app(&upstream)
        .oneshot(login_request(json!({ "cookies": "ssid=stale" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "COOKIES_EXPIRED");
    assert_eq!(body["error"]["details"]["needs_fresh_cookies"], true);
}

// ============================================================================
// Store
// ============================================================================

#[tokio::test]
async fn test_store_requires_token() {
    let upstream = MockServer::start().await;
    let response = app(&upstream).oneshot(get("/api/store/data")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_store_rejects_garbage_token() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .uri("/api/store/data")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "MALFORMED_TOKEN");
}

#[tokio::test]
async fn test_store_raw_with_session_cookie() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;
    Mock::given(method("POST"))
        .and(path("/store/eu/storefront/puuid-1"))
        .and(header_is("Authorization", "Bearer ACCESS"))
        .and(header_is("X-Riot-Entitlements-JWT", "ENT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Raw":true}"#))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = app(&upstream);
    let token = login_token(&app).await;

    let request = Request::builder()
        .uri("/api/store/raw")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], br#"{"Raw":true}"#);
}

#[tokio::test]
async fn test_store_data_region_override() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;
    Mock::given(method("POST"))
        .and(path("/store/kr/storefront/puuid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SkinsPanelLayout": { "SingleItemOffers": ["a", "b", "c", "d"] }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = app(&upstream);
    let token = login_token(&app).await;

    let response = app
        .oneshot(get(&format!("/api/store/data?region=kr&token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["data"]["SkinsPanelLayout"]["SingleItemOffers"],
        json!(["a", "b", "c", "d"])
    );
}

#[tokio::test]
async fn test_store_upstream_failure_is_bad_gateway() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;
    Mock::given(method("POST"))
        .and(path("/store/eu/storefront/puuid-1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden detail"))
        .mount(&upstream)
        .await;

    let app = app(&upstream);
    let token = login_token(&app).await;

    let request = Request::builder()
        .uri("/api/store/data")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "RESOURCE_FETCH_FAILED");
    assert!(!body.to_string().contains("forbidden detail"));
}

#[tokio::test]
async fn test_store_rejects_malformed_query_with_envelope() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;

    let app = app(&upstream);
    let token = login_token(&app).await;

    let response = app
        .oneshot(get(&format!("/api/store/raw?region=eu&region=kr&token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "BAD_REQUEST");
}

// ============================================================================
// Timeouts
// ============================================================================

fn tight_timeouts(upstream: &MockServer, upstream_secs: u64) -> AuthConfig {
    AuthConfig::new(SECRET)
        .with_endpoints(endpoints(&upstream.uri()))
        .with_timeouts(
            Duration::from_secs(1),
            Duration::from_secs(upstream_secs),
            Duration::from_secs(upstream_secs),
        )
}

async fn mount_slow_storefront(upstream: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/store/eu/storefront/puuid-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(delay),
        )
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_upstream_timeout_is_gateway_timeout() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;
    mount_slow_storefront(&upstream, Duration::from_secs(3)).await;

    let app = app_with(tight_timeouts(&upstream, 1), Duration::from_secs(10));
    let token = login_token(&app).await;

    let response = app
        .oneshot(get(&format!("/api/store/raw?token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["error"]["code"], "UPSTREAM_TIMEOUT");
}

#[tokio::test]
async fn test_route_timeout_uses_error_envelope() {
    let upstream = MockServer::start().await;
    mount_login_flow(&upstream).await;
    mount_slow_storefront(&upstream, Duration::from_secs(3)).await;

    // Route gives up before the upstream client does
    let app = app_with(tight_timeouts(&upstream, 2), Duration::from_secs(1));
    let token = login_token(&app).await;

    let response = app
        .oneshot(get(&format!("/api/store/raw?token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
    assert!(body["error"]["message"].is_string());
}

// ============================================================================
// CORS
// ============================================================================

#[test]
fn test_cors_layer_skips_wildcard_origin() {
    let origins = vec!["*".to_string(), "http://localhost:3000".to_string()];
    let _layer = cors_layer(&origins);
}

#[tokio::test]
async fn test_cors_allows_configured_origin_with_credentials() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/auth/ping")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .uri("/api/auth/ping")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
