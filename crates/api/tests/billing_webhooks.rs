//! Webhook receiver integration tests.
//!
//! Payloads are signed with the same HMAC construction the verifier
//! checks, so these exercise the real signature path end to end.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, post_signed_webhook};
use promptstash_db::models::user::{SubscriptionUpdate, User};
use promptstash_db::repositories::UserRepo;
use sqlx::PgPool;
use tower::ServiceExt;

const CUSTOMER_ID: &str = "cus_test_1";

/// Seed a user bound to [`CUSTOMER_ID`].
async fn seed_customer(pool: &PgPool) -> User {
    let user = UserRepo::upsert_by_auth0_id(pool, "auth0|billing", Some("b@example.com"), "billy")
        .await
        .expect("seed user");

    let mut update = SubscriptionUpdate::new(user.tier.clone(), user.subscription_status.clone());
    update.stripe_customer_id = Some(CUSTOMER_ID.to_string());
    UserRepo::update_subscription(pool, user.id, &update)
        .await
        .expect("bind customer")
        .expect("user exists")
}

async fn reload(pool: &PgPool, id: i64) -> User {
    UserRepo::find_by_id(pool, id)
        .await
        .expect("reload")
        .expect("user exists")
}

fn event(event_type: &str, object: serde_json::Value) -> String {
    serde_json::json!({
        "type": event_type,
        "data": { "object": object }
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Happy-path reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn checkout_completed_promotes_to_pro(pool: PgPool) {
    let user = seed_customer(&pool).await;

    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    let response =
        post_signed_webhook(common::build_test_app(pool.clone()), "/api/v1/billing/stripe-webhooks", &body)
            .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "pro");
    assert_eq!(user.subscription_status, "active");
    assert_eq!(user.stripe_customer_id.as_deref(), Some(CUSTOMER_ID));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn replaying_an_event_converges_to_the_same_state(pool: PgPool) {
    let user = seed_customer(&pool).await;
    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );

    for _ in 0..2 {
        let response = post_signed_webhook(
            common::build_test_app(pool.clone()),
            "/api/v1/billing/stripe-webhooks",
            &body,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "pro");
    assert_eq!(user.subscription_status, "active");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn subscription_updated_maps_status_and_records_window(pool: PgPool) {
    let user = seed_customer(&pool).await;

    let body = event(
        "customer.subscription.updated",
        serde_json::json!({
            "customer": CUSTOMER_ID,
            "status": "past_due",
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000
        }),
    );
    let response = post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "pro");
    assert_eq!(user.subscription_status, "past_due");
    assert_eq!(
        user.subscription_start_at.map(|t| t.timestamp()),
        Some(1_700_000_000)
    );
    assert_eq!(
        user.subscription_end_at.map(|t| t.timestamp()),
        Some(1_702_592_000)
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn subscription_updated_mirrors_unknown_status(pool: PgPool) {
    let user = seed_customer(&pool).await;

    let body = event(
        "customer.subscription.updated",
        serde_json::json!({ "customer": CUSTOMER_ID, "status": "trialing" }),
    );
    post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "free", "tier is kept");
    assert_eq!(user.subscription_status, "trialing", "status mirrored verbatim");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn payment_failed_then_succeeded_round_trips(pool: PgPool) {
    let user = seed_customer(&pool).await;

    // Promote first so there is a pro subscription to fail.
    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    let body = event(
        "invoice.payment_failed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    let mid = reload(&pool, user.id).await;
    assert_eq!(mid.tier, "pro", "failed payment keeps the tier");
    assert_eq!(mid.subscription_status, "past_due");

    let body = event(
        "invoice.payment_succeeded",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    let restored = reload(&pool, user.id).await;
    assert_eq!(restored.tier, "pro");
    assert_eq!(restored.subscription_status, "active");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn payment_succeeded_for_active_user_is_a_noop(pool: PgPool) {
    let user = seed_customer(&pool).await;

    let body = event(
        "invoice.payment_succeeded",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    let response = post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "free", "nothing to restore");
    assert_eq!(user.subscription_status, "active");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn subscription_deleted_downgrades(pool: PgPool) {
    let user = seed_customer(&pool).await;

    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    let body = event(
        "customer.subscription.deleted",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );
    post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "free");
    assert_eq!(user.subscription_status, "cancelled");
}

// ---------------------------------------------------------------------------
// Rejections and no-ops
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_customer_is_acknowledged_without_changes(pool: PgPool) {
    let user = seed_customer(&pool).await;

    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": "cus_out_of_band" }),
    );
    let response = post_signed_webhook(
        common::build_test_app(pool.clone()),
        "/api/v1/billing/stripe-webhooks",
        &body,
    )
    .await;

    // 200 so the processor does not retry.
    assert_eq!(response.status(), StatusCode::OK);

    let user = reload(&pool, user.id).await;
    assert_eq!(user.tier, "free");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bad_signature_is_rejected(pool: PgPool) {
    seed_customer(&pool).await;
    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );

    let timestamp = chrono::Utc::now().timestamp();
    let app = common::build_test_app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/billing/stripe-webhooks")
                .header("content-type", "application/json")
                .header("stripe-signature", format!("t={timestamp},v1=deadbeef"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_signature_header_is_rejected(pool: PgPool) {
    let body = event(
        "checkout.session.completed",
        serde_json::json!({ "customer": CUSTOMER_ID }),
    );

    let app = common::build_test_app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/billing/stripe-webhooks")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn malformed_payload_with_valid_signature_is_rejected(pool: PgPool) {
    let response = post_signed_webhook(
        common::build_test_app(pool),
        "/api/v1/billing/stripe-webhooks",
        "not json at all",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid payload");
}
