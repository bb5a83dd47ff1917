//! Thin client for the payment processor's REST API.
//!
//! Only the three calls the billing flow needs: create a customer, create a
//! checkout session, create a billing-portal session. All are single
//! form-encoded POSTs returning a redirect URL or an id; no SDK, no retries.
//! Webhook payload types for the inbound direction live here too.

use std::time::Duration;

use promptstash_core::error::CoreError;
use promptstash_core::types::DbId;
use serde::Deserialize;

/// Stripe REST API base URL.
const API_BASE: &str = "https://api.stripe.com/v1";

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for outbound payment-processor calls.
///
/// Holds the configured secret key; when the deployment has none, every
/// call fails with a service-unavailable error rather than at startup.
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Create a client with the deployment's secret key, if configured.
    pub fn new(secret_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, secret_key }
    }

    fn key(&self) -> Result<&str, CoreError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| CoreError::Unavailable("Stripe is not configured".into()))
    }

    /// Create a customer for a user, tagging it with our identifiers.
    /// Returns the processor's customer id.
    pub async fn create_customer(
        &self,
        email: Option<&str>,
        user_id: DbId,
        auth0_id: &str,
    ) -> Result<String, CoreError> {
        let user_id = user_id.to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("metadata[user_id]", user_id.as_str()),
            ("metadata[auth0_id]", auth0_id),
        ];
        if let Some(email) = email {
            form.push(("email", email));
        }

        let customer: CustomerResponse = self.post("/customers", &form).await?;
        Ok(customer.id)
    }

    /// Create a subscription checkout session for one price. Returns the
    /// redirect URL the caller should send the browser to.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String, CoreError> {
        // The processor substitutes the placeholder after payment.
        let success_url = format!("{success_url}?session_id={{CHECKOUT_SESSION_ID}}");
        let form: Vec<(&str, &str)> = vec![
            ("customer", customer_id),
            ("mode", "subscription"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url),
        ];

        let session: SessionResponse = self.post("/checkout/sessions", &form).await?;
        Ok(session.url)
    }

    /// Create a self-service billing-portal session. Returns the redirect URL.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, CoreError> {
        let form: Vec<(&str, &str)> = vec![("customer", customer_id), ("return_url", return_url)];
        let session: SessionResponse = self.post("/billing_portal/sessions", &form).await?;
        Ok(session.url)
    }

    /// Execute one form-encoded POST and decode the JSON response.
    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, CoreError> {
        let key = self.key()?;

        let response = self
            .client
            .post(format!("{API_BASE}{path}"))
            .basic_auth(key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path, "Stripe request failed");
                CoreError::Unavailable("Could not reach the payment processor".into())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            tracing::warn!(%status, path, "Stripe returned an error");
            return Err(CoreError::Validation(format!("Stripe error: {message}")));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(error = %e, path, "Malformed Stripe response");
            CoreError::Unavailable("Malformed response from the payment processor".into())
        })
    }
}

// ---------------------------------------------------------------------------
// Webhook payload types
// ---------------------------------------------------------------------------

/// A webhook delivery from the processor. Only the fields the
/// reconciliation handlers read are modeled.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

/// The event's subject: a checkout session, subscription, or invoice.
/// All carry an optional customer reference; subscriptions add their status
/// and billing-period window.
#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    pub customer: Option<String>,
    pub status: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
