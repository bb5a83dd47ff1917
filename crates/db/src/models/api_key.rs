//! Provider API key models and DTOs.
//!
//! **Note:** `encrypted_key` is never serialized to responses; callers see
//! only the masked preview.

use promptstash_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `user_api_keys` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserApiKey {
    pub id: DbId,
    pub user_id: DbId,
    /// Lowercased provider name, e.g. `openai`.
    pub provider: String,
    #[serde(skip_serializing)]
    pub encrypted_key: String,
    pub masked_key: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for storing a new provider key. The plaintext is encrypted before it
/// reaches the repository.
#[derive(Debug, Deserialize)]
pub struct CreateUserApiKey {
    pub provider: String,
    pub api_key: String,
}

/// DTO for rotating an existing provider key.
#[derive(Debug, Deserialize)]
pub struct UpdateUserApiKey {
    pub api_key: String,
}
