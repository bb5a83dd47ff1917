//! Repository for the `prompt_versions` table.

use promptstash_core::types::DbId;
use sqlx::PgPool;

use crate::models::prompt_version::{CreatePromptVersion, PromptVersion};

/// Column list for prompt_versions queries.
const COLUMNS: &str = "id, prompt_id, version, body, notes, llm_provider, model_id, created_at";

/// Provides CRUD operations for prompt versions.
pub struct PromptVersionRepo;

impl PromptVersionRepo {
    /// Append a new version, auto-incrementing the version number for the
    /// prompt, and move the prompt's `latest_version` pointer in the same
    /// transaction. Returns the created row.
    ///
    /// The number is assigned inside the INSERT; a concurrent append loses
    /// to the unique constraint instead of producing a duplicate.
    pub async fn create(
        pool: &PgPool,
        prompt_id: DbId,
        input: &CreatePromptVersion,
    ) -> Result<PromptVersion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert = format!(
            "INSERT INTO prompt_versions
                (prompt_id, version, body, notes, llm_provider, model_id)
             VALUES ($1,
                     COALESCE((SELECT MAX(version) FROM prompt_versions WHERE prompt_id = $1), 0) + 1,
                     $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, PromptVersion>(&insert)
            .bind(prompt_id)
            .bind(&input.text)
            .bind(&input.notes)
            .bind(&input.llm_provider)
            .bind(&input.model_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE prompts SET latest_version = $2, updated_at = now() WHERE id = $1")
            .bind(prompt_id)
            .bind(version.version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(version)
    }

    /// List a prompt's versions, newest first.
    pub async fn list_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<PromptVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_versions
             WHERE prompt_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, PromptVersion>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }

    /// Find a specific version by prompt and version number.
    pub async fn find_by_number(
        pool: &PgPool,
        prompt_id: DbId,
        version: i32,
    ) -> Result<Option<PromptVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_versions
             WHERE prompt_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, PromptVersion>(&query)
            .bind(prompt_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the notes of a version. Notes are the only mutable field;
    /// passing `None` clears them.
    pub async fn update_notes(
        pool: &PgPool,
        prompt_id: DbId,
        version: i32,
        notes: Option<&str>,
    ) -> Result<Option<PromptVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE prompt_versions SET notes = $3
             WHERE prompt_id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromptVersion>(&query)
            .bind(prompt_id)
            .bind(version)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Count the versions of a prompt (tier-limit input).
    pub async fn count_for_prompt(pool: &PgPool, prompt_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM prompt_versions WHERE prompt_id = $1")
                .bind(prompt_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
