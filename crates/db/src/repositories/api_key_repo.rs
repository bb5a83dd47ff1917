//! Repository for the `user_api_keys` table.
//!
//! Only ciphertext and the masked preview ever reach this layer; encryption
//! happens in the API handlers via `promptstash_core::secrets`.

use promptstash_core::types::DbId;
use sqlx::PgPool;

use crate::models::api_key::UserApiKey;

/// Column list for user_api_keys queries.
const COLUMNS: &str = "id, user_id, provider, encrypted_key, masked_key, created_at, updated_at";

/// Provides CRUD operations for per-provider API keys.
pub struct ApiKeyRepo;

impl ApiKeyRepo {
    /// Insert a key for a (user, provider) pair. A duplicate pair violates
    /// `uq_user_api_keys_user_provider` and surfaces as a conflict.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        provider: &str,
        encrypted_key: &str,
        masked_key: &str,
    ) -> Result<UserApiKey, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_api_keys (user_id, provider, encrypted_key, masked_key)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserApiKey>(&query)
            .bind(user_id)
            .bind(provider)
            .bind(encrypted_key)
            .bind(masked_key)
            .fetch_one(pool)
            .await
    }

    /// List a user's stored keys, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserApiKey>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_api_keys
             WHERE user_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, UserApiKey>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find a user's key for one provider.
    pub async fn find_by_provider(
        pool: &PgPool,
        user_id: DbId,
        provider: &str,
    ) -> Result<Option<UserApiKey>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM user_api_keys WHERE user_id = $1 AND provider = $2");
        sqlx::query_as::<_, UserApiKey>(&query)
            .bind(user_id)
            .bind(provider)
            .fetch_optional(pool)
            .await
    }

    /// Rotate a stored key: replace ciphertext and masked preview.
    ///
    /// Returns `None` if the user has no key for that provider.
    pub async fn rotate(
        pool: &PgPool,
        user_id: DbId,
        provider: &str,
        encrypted_key: &str,
        masked_key: &str,
    ) -> Result<Option<UserApiKey>, sqlx::Error> {
        let query = format!(
            "UPDATE user_api_keys SET
                encrypted_key = $3,
                masked_key = $4,
                updated_at = now()
             WHERE user_id = $1 AND provider = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserApiKey>(&query)
            .bind(user_id)
            .bind(provider)
            .bind(encrypted_key)
            .bind(masked_key)
            .fetch_optional(pool)
            .await
    }

    /// Delete a user's key for one provider. Returns `true` if a row was
    /// deleted.
    pub async fn delete(
        pool: &PgPool,
        user_id: DbId,
        provider: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_api_keys WHERE user_id = $1 AND provider = $2")
            .bind(user_id)
            .bind(provider)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
