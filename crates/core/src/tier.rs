//! Subscription tier policy: plan levels, usage ceilings, and the guard
//! functions that gate prompt/version creation.
//!
//! The stored tier is never mutated here. A `pro` user whose subscription
//! is not `active` is *treated* as free for limit purposes only; billing
//! reconciliation (see [`crate::billing`]) is the sole writer of tier state.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Subscription status values
// ---------------------------------------------------------------------------

/// Statuses written by billing reconciliation. The column itself is free-form
/// because `customer.subscription.updated` mirrors unrecognized processor
/// statuses verbatim.
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PAST_DUE: &str = "past_due";
pub const STATUS_CANCELLED: &str = "cancelled";

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Subscription plan level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }

    /// Parse a stored tier value. Anything unrecognized is treated as free,
    /// matching the default applied to unknown users.
    pub fn parse(value: &str) -> Tier {
        match value {
            "pro" => Tier::Pro,
            _ => Tier::Free,
        }
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum prompts a free-tier user may hold.
pub const FREE_MAX_PROMPTS: i64 = 20;

/// Maximum versions per prompt on the free tier.
pub const FREE_MAX_VERSIONS_PER_PROMPT: i64 = 3;

/// Usage ceilings for a tier. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierLimits {
    pub max_prompts: Option<i64>,
    pub max_versions_per_prompt: Option<i64>,
}

/// Ceilings for the given tier.
pub fn limits_for(tier: Tier) -> TierLimits {
    match tier {
        Tier::Free => TierLimits {
            max_prompts: Some(FREE_MAX_PROMPTS),
            max_versions_per_prompt: Some(FREE_MAX_VERSIONS_PER_PROMPT),
        },
        Tier::Pro => TierLimits {
            max_prompts: None,
            max_versions_per_prompt: None,
        },
    }
}

/// The tier used for limit checks. A pro subscription that is not `active`
/// counts as free without the stored value changing.
pub fn effective_tier(tier: Tier, subscription_status: &str) -> Tier {
    if tier == Tier::Pro && subscription_status != STATUS_ACTIVE {
        Tier::Free
    } else {
        tier
    }
}

// ---------------------------------------------------------------------------
// Tier info (read route payload)
// ---------------------------------------------------------------------------

/// Snapshot of a user's plan and usage, returned by the tier-info route.
#[derive(Debug, Clone, Serialize)]
pub struct TierInfo {
    pub tier: Tier,
    pub subscription_status: String,
    pub prompt_count: i64,
    pub prompt_limit: Option<i64>,
    pub can_create_prompt: bool,
    /// Version creation is gated per prompt; without a prompt in hand this
    /// is reported as allowed and checked at creation time.
    pub can_create_version: bool,
}

impl TierInfo {
    /// Compute tier info from stored state and a live prompt count.
    pub fn compute(stored_tier: Tier, subscription_status: &str, prompt_count: i64) -> TierInfo {
        let tier = effective_tier(stored_tier, subscription_status);
        let limits = limits_for(tier);

        let can_create_prompt = match limits.max_prompts {
            Some(max) => prompt_count < max,
            None => true,
        };

        TierInfo {
            tier,
            subscription_status: subscription_status.to_string(),
            prompt_count,
            prompt_limit: limits.max_prompts,
            can_create_prompt,
            can_create_version: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Reject prompt creation when the effective tier's ceiling is reached.
pub fn check_prompt_creation(
    stored_tier: Tier,
    subscription_status: &str,
    prompt_count: i64,
) -> Result<(), CoreError> {
    let limits = limits_for(effective_tier(stored_tier, subscription_status));
    if let Some(max) = limits.max_prompts {
        if prompt_count >= max {
            return Err(CoreError::LimitExceeded {
                what: "prompt",
                limit: max,
            });
        }
    }
    Ok(())
}

/// Reject version creation when the prompt already holds the effective
/// tier's maximum number of versions.
pub fn check_version_creation(
    stored_tier: Tier,
    subscription_status: &str,
    version_count: i64,
) -> Result<(), CoreError> {
    let limits = limits_for(effective_tier(stored_tier, subscription_status));
    if let Some(max) = limits.max_versions_per_prompt {
        if version_count >= max {
            return Err(CoreError::LimitExceeded {
                what: "version",
                limit: max,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
