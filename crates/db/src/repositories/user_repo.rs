//! Repository for the `users` table.

use promptstash_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{SubscriptionUpdate, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, auth0_id, email, username, tier, subscription_status, \
    stripe_customer_id, subscription_start_at, subscription_end_at, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Fetch-or-create keyed on the external subject, in one idempotent
    /// statement. Replaying the same subject always returns the same row;
    /// email/username are only used when the row is first created.
    pub async fn upsert_by_auth0_id(
        pool: &PgPool,
        auth0_id: &str,
        email: Option<&str>,
        username: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (auth0_id, email, username)
             VALUES ($1, $2, $3)
             ON CONFLICT (auth0_id) DO UPDATE SET auth0_id = EXCLUDED.auth0_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(auth0_id)
            .bind(email)
            .bind(username)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by the identity provider's subject.
    pub async fn find_by_auth0_id(
        pool: &PgPool,
        auth0_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE auth0_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(auth0_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by payment-processor customer reference.
    pub async fn find_by_stripe_customer_id(
        pool: &PgPool,
        stripe_customer_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE stripe_customer_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(stripe_customer_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a subscription change. Tier and status always overwrite; the
    /// customer reference and subscription window only when provided.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_subscription(
        pool: &PgPool,
        id: DbId,
        update: &SubscriptionUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                tier = $2,
                subscription_status = $3,
                stripe_customer_id = COALESCE($4, stripe_customer_id),
                subscription_start_at = COALESCE($5, subscription_start_at),
                subscription_end_at = COALESCE($6, subscription_end_at),
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&update.tier)
            .bind(&update.status)
            .bind(&update.stripe_customer_id)
            .bind(update.subscription_start_at)
            .bind(update.subscription_end_at)
            .fetch_optional(pool)
            .await
    }
}
