//! Shared fixtures and request helpers for HTTP-level integration tests.
//!
//! Uses Axum's `tower::ServiceExt::oneshot` to send requests directly to
//! the router without a TCP listener, through the same middleware stack
//! production uses.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use promptstash_api::config::{Auth0Config, BillingConfig, ServerConfig};
use promptstash_api::router::build_app_router;
use promptstash_api::state::AppState;

/// Webhook signing secret used by billing tests.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Build a test `ServerConfig` with safe defaults.
///
/// Auth0 is intentionally unconfigured: bearer-authenticated routes reject
/// before any identity-provider traffic, and the webhook receiver does not
/// use bearer auth at all.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        auth0: Auth0Config {
            domain: None,
            audience: None,
            jwks_cache_ttl_secs: 3600,
        },
        billing: BillingConfig {
            secret_key: None,
            webhook_secret: Some(TEST_WEBHOOK_SECRET.to_string()),
            pro_price_id: Some("price_test_pro".to_string()),
        },
        encryption_key_hex: Some("42".repeat(32)),
        frontend_url: "http://localhost:5173".to_string(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request build"),
    )
    .await
    .expect("request send")
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request build"),
    )
    .await
    .expect("request send")
}

/// POST a raw webhook body with a freshly computed processor signature.
pub async fn post_signed_webhook(app: Router, uri: &str, body: &str) -> Response<Body> {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = promptstash_core::webhook::sign_payload(
        TEST_WEBHOOK_SECRET,
        timestamp,
        body.as_bytes(),
    );

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("stripe-signature", format!("t={timestamp},v1={signature}"))
            .body(Body::from(body.to_string()))
            .expect("request build"),
    )
    .await
    .expect("request send")
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}
