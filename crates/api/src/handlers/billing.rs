//! Billing handlers: checkout/portal session creation and the webhook
//! receiver that reconciles processor events into subscription state.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::billing::{
    self, SubscriptionChange, EVENT_CHECKOUT_COMPLETED, EVENT_PAYMENT_FAILED,
    EVENT_PAYMENT_SUCCEEDED, EVENT_SUBSCRIPTION_DELETED, EVENT_SUBSCRIPTION_UPDATED,
};
use promptstash_core::error::CoreError;
use promptstash_core::tier::Tier;
use promptstash_core::webhook::verify_signature;
use promptstash_db::models::user::{SubscriptionUpdate, User};
use promptstash_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::clients::stripe::{WebhookEvent, WebhookObject};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Checkout / portal sessions
// ---------------------------------------------------------------------------

/// Request body for checkout-session creation. The price falls back to the
/// configured pro price; redirect URLs fall back to the frontend origin.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub price_id: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// POST /api/v1/billing/create-checkout-session
///
/// Create a subscription checkout session, creating (and persisting) a
/// processor customer for the user first if none is stored.
pub async fn create_checkout_session(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let price_id = request
        .price_id
        .or_else(|| state.config.billing.pro_price_id.clone())
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "price_id is required and no default price is configured".into(),
            ))
        })?;

    let customer_id = match &user.stripe_customer_id {
        Some(id) => id.clone(),
        None => {
            let customer_id = state
                .stripe
                .create_customer(user.email.as_deref(), user.id, &user.auth0_id)
                .await?;

            // Persist the reference so the webhook can find the user and a
            // second checkout reuses the customer.
            let mut update =
                SubscriptionUpdate::new(user.tier.clone(), user.subscription_status.clone());
            update.stripe_customer_id = Some(customer_id.clone());
            UserRepo::update_subscription(&state.pool, user.id, &update).await?;

            tracing::info!(user_id = user.id, "Stripe customer created");
            customer_id
        }
    };

    let frontend = &state.config.frontend_url;
    let success_url = request
        .success_url
        .unwrap_or_else(|| format!("{frontend}/billing/success"));
    let cancel_url = request
        .cancel_url
        .unwrap_or_else(|| format!("{frontend}/billing/cancel"));

    let checkout_url = state
        .stripe
        .create_checkout_session(&customer_id, &price_id, &success_url, &cancel_url)
        .await?;

    Ok(Json(DataResponse {
        data: CheckoutResponse { checkout_url },
    }))
}

/// Request body for portal-session creation.
#[derive(Debug, Deserialize)]
pub struct PortalRequest {
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub portal_url: String,
}

/// POST /api/v1/billing/create-customer-portal-session
///
/// Create a self-service billing-portal session. Requires an existing
/// processor customer (i.e. the user has been through checkout).
pub async fn create_portal_session(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<PortalRequest>,
) -> AppResult<impl IntoResponse> {
    let customer_id = user.stripe_customer_id.as_deref().ok_or_else(|| {
        AppError::Core(CoreError::not_found("Subscription", &user.username))
    })?;

    let return_url = request
        .return_url
        .unwrap_or_else(|| format!("{}/settings", state.config.frontend_url));

    let portal_url = state
        .stripe
        .create_portal_session(customer_id, &return_url)
        .await?;

    Ok(Json(DataResponse {
        data: PortalResponse { portal_url },
    }))
}

// ---------------------------------------------------------------------------
// Webhook receiver
// ---------------------------------------------------------------------------

/// POST /api/v1/billing/stripe-webhooks
///
/// Verify the processor signature, then reconcile the event into local
/// subscription state. Replays converge: every handler is idempotent.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let secret = state
        .config
        .billing
        .webhook_secret
        .as_deref()
        .ok_or_else(|| {
            AppError::Core(CoreError::Unavailable(
                "Stripe webhook secret not configured".into(),
            ))
        })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Missing stripe-signature header".into(),
            ))
        })?;

    verify_signature(&body, signature, secret, chrono::Utc::now().timestamp())?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| AppError::Core(CoreError::Validation("Invalid payload".into())))?;

    reconcile_event(&state, &event).await?;

    Ok(Json(json!({ "status": "success" })))
}

/// Dispatch one verified event to its reconciliation handler.
///
/// Events for customers we do not know are acknowledged without error so
/// the processor does not retry them, but logged for investigation.
async fn reconcile_event(state: &AppState, event: &WebhookEvent) -> AppResult<()> {
    let object = &event.data.object;

    let Some(customer_id) = object.customer.as_deref() else {
        tracing::debug!(event_type = %event.event_type, "Webhook event without customer; ignored");
        return Ok(());
    };

    let Some(user) = UserRepo::find_by_stripe_customer_id(&state.pool, customer_id).await? else {
        tracing::warn!(
            customer_id,
            event_type = %event.event_type,
            "Webhook event for unknown customer; ignored",
        );
        return Ok(());
    };

    let current_tier = Tier::parse(&user.tier);

    let change = match event.event_type.as_str() {
        EVENT_CHECKOUT_COMPLETED => Some(billing::on_checkout_completed()),
        EVENT_SUBSCRIPTION_UPDATED => match object.status.as_deref() {
            Some(status) => Some(billing::on_subscription_updated(current_tier, status)),
            None => {
                tracing::debug!(customer_id, "Subscription update without status; ignored");
                None
            }
        },
        EVENT_SUBSCRIPTION_DELETED => Some(billing::on_subscription_deleted()),
        EVENT_PAYMENT_SUCCEEDED => billing::on_payment_succeeded(&user.subscription_status),
        EVENT_PAYMENT_FAILED => Some(billing::on_payment_failed(current_tier)),
        other => {
            tracing::debug!(event_type = other, "Unhandled webhook event type");
            None
        }
    };

    if let Some(change) = change {
        apply_change(state, &user, customer_id, object, change, &event.event_type).await?;
    }
    Ok(())
}

/// Write a subscription change back to the user row.
async fn apply_change(
    state: &AppState,
    user: &User,
    customer_id: &str,
    object: &WebhookObject,
    change: SubscriptionChange,
    event_type: &str,
) -> AppResult<()> {
    let mut update = SubscriptionUpdate::new(change.tier.as_str(), change.status.clone());
    // Checkout is the first event that can bind a customer to the user.
    update.stripe_customer_id = Some(customer_id.to_string());
    update.subscription_start_at = object
        .current_period_start
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0));
    update.subscription_end_at = object
        .current_period_end
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0));

    UserRepo::update_subscription(&state.pool, user.id, &update).await?;

    tracing::info!(
        user_id = user.id,
        event_type,
        tier = change.tier.as_str(),
        status = %change.status,
        "Subscription reconciled",
    );
    Ok(())
}
