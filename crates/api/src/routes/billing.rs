//! Route definitions for billing.
//!
//! The webhook receiver is the one route without bearer auth; it is
//! authenticated by the processor's signature header instead.

use axum::routing::post;
use axum::Router;

use crate::handlers::billing;
use crate::state::AppState;

/// Billing routes mounted at `/billing`.
///
/// ```text
/// POST /create-checkout-session        -> create_checkout_session
/// POST /create-customer-portal-session -> create_portal_session
/// POST /stripe-webhooks                -> stripe_webhook (signature auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/create-checkout-session",
            post(billing::create_checkout_session),
        )
        .route(
            "/create-customer-portal-session",
            post(billing::create_portal_session),
        )
        .route("/stripe-webhooks", post(billing::stripe_webhook))
}
