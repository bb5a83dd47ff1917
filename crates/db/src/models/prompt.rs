//! Prompt models and DTOs.

use promptstash_core::tags::PromptTag;
use promptstash_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `prompts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub user_id: DbId,
    /// Per-user public sequence number; rendered as `prompt{seq}`.
    pub seq: DbId,
    pub title: String,
    pub tags: Json<Vec<PromptTag>>,
    /// Highest version number; always names an existing version row.
    pub latest_version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a prompt together with its initial version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<PromptTag>,
    pub initial_version_text: String,
    pub initial_version_notes: Option<String>,
}

/// Partial patch for a prompt. The tag list, when present, replaces the
/// stored collection whole.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePrompt {
    pub title: Option<String>,
    pub tags: Option<Vec<PromptTag>>,
}
