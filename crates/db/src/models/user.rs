//! User models and DTOs.

use promptstash_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Opaque subject from the identity provider, e.g. `auth0|abc123`.
    pub auth0_id: String,
    pub email: Option<String>,
    pub username: String,
    /// `free` or `pro`. Written only by billing reconciliation.
    pub tier: String,
    /// `active`, `past_due`, `cancelled`, or a processor status mirrored
    /// verbatim by subscription-updated reconciliation.
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    pub subscription_start_at: Option<Timestamp>,
    pub subscription_end_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Subscription fields applied by webhook reconciliation.
///
/// `tier` and `status` always overwrite; the optional fields only overwrite
/// when present.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate {
    pub tier: String,
    pub status: String,
    pub stripe_customer_id: Option<String>,
    pub subscription_start_at: Option<Timestamp>,
    pub subscription_end_at: Option<Timestamp>,
}

impl SubscriptionUpdate {
    /// A tier/status-only update.
    pub fn new(tier: impl Into<String>, status: impl Into<String>) -> Self {
        SubscriptionUpdate {
            tier: tier.into(),
            status: status.into(),
            stripe_customer_id: None,
            subscription_start_at: None,
            subscription_end_at: None,
        }
    }
}
