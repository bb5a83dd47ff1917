//! Webhook reconciliation: pure transition functions from payment-processor
//! events to local subscription state.
//!
//! This module lives in `core` (zero internal deps) so the transition table
//! can be unit-tested without a database; the API webhook handler applies
//! the returned change in a single row update. Every function here is
//! idempotent: feeding it the state it produces yields the same state.

use crate::tier::{Tier, STATUS_ACTIVE, STATUS_CANCELLED, STATUS_PAST_DUE};

// ---------------------------------------------------------------------------
// Event type constants
// ---------------------------------------------------------------------------

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const EVENT_SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const EVENT_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const EVENT_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "invoice.payment_failed";

// ---------------------------------------------------------------------------
// Transition result
// ---------------------------------------------------------------------------

/// The tier/status pair a reconciliation handler writes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChange {
    pub tier: Tier,
    pub status: String,
}

impl SubscriptionChange {
    fn new(tier: Tier, status: impl Into<String>) -> Self {
        SubscriptionChange {
            tier,
            status: status.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// `checkout.session.completed`: the user paid, promote to pro/active.
pub fn on_checkout_completed() -> SubscriptionChange {
    SubscriptionChange::new(Tier::Pro, STATUS_ACTIVE)
}

/// `customer.subscription.updated`: map the processor-reported status onto
/// local tier/status. Unrecognized statuses keep the current tier and are
/// mirrored verbatim.
pub fn on_subscription_updated(current_tier: Tier, processor_status: &str) -> SubscriptionChange {
    match processor_status {
        "active" => SubscriptionChange::new(Tier::Pro, STATUS_ACTIVE),
        "past_due" | "unpaid" => SubscriptionChange::new(Tier::Pro, STATUS_PAST_DUE),
        "canceled" | "incomplete_expired" => SubscriptionChange::new(Tier::Free, STATUS_CANCELLED),
        other => SubscriptionChange::new(current_tier, other),
    }
}

/// `customer.subscription.deleted`: downgrade to free/cancelled.
pub fn on_subscription_deleted() -> SubscriptionChange {
    SubscriptionChange::new(Tier::Free, STATUS_CANCELLED)
}

/// `invoice.payment_succeeded`: restore pro/active, but only for a user who
/// was past due or unpaid. Returns `None` when no change is needed.
pub fn on_payment_succeeded(current_status: &str) -> Option<SubscriptionChange> {
    if current_status == STATUS_PAST_DUE || current_status == "unpaid" {
        Some(SubscriptionChange::new(Tier::Pro, STATUS_ACTIVE))
    } else {
        None
    }
}

/// `invoice.payment_failed`: keep the tier, mark past due.
pub fn on_payment_failed(current_tier: Tier) -> SubscriptionChange {
    SubscriptionChange::new(current_tier, STATUS_PAST_DUE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
