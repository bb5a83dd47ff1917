//! Prompt version models and DTOs.

use promptstash_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `prompt_versions` table. Append-only; only `notes` is
/// mutable after creation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptVersion {
    pub id: DbId,
    pub prompt_id: DbId,
    /// Per-prompt number starting at 1; rendered as `v{version}`.
    pub version: i32,
    pub body: String,
    pub notes: Option<String>,
    /// Provenance: which provider produced this text, if any.
    pub llm_provider: Option<String>,
    pub model_id: Option<String>,
    pub created_at: Timestamp,
}

/// Input for appending a version to an existing prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromptVersion {
    pub text: String,
    pub notes: Option<String>,
    pub llm_provider: Option<String>,
    pub model_id: Option<String>,
}

/// Request body for the notes-update route.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVersionNotes {
    pub notes: Option<String>,
}
