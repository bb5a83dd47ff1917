//! Repository for the `prompts` table.

use promptstash_core::tags::PromptTag;
use promptstash_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::prompt::{CreatePrompt, Prompt, UpdatePrompt};

/// Column list for prompts queries.
const COLUMNS: &str = "id, user_id, seq, title, tags, latest_version, created_at, updated_at";

/// Provides CRUD operations for prompts.
pub struct PromptRepo;

impl PromptRepo {
    /// Insert a new prompt together with its initial version, atomically.
    ///
    /// The per-user sequence number is assigned inside the INSERT and backed
    /// by a unique constraint; the initial version is always number 1 and
    /// `latest_version` starts there.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreatePrompt,
    ) -> Result<Prompt, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_prompt = format!(
            "INSERT INTO prompts (user_id, seq, title, tags, latest_version)
             VALUES ($1,
                     COALESCE((SELECT MAX(seq) FROM prompts WHERE user_id = $1), 0) + 1,
                     $2, $3, 1)
             RETURNING {COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&insert_prompt)
            .bind(user_id)
            .bind(&input.title)
            .bind(Json(&input.tags))
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO prompt_versions (prompt_id, version, body, notes)
             VALUES ($1, 1, $2, $3)",
        )
        .bind(prompt.id)
        .bind(&input.initial_version_text)
        .bind(&input.initial_version_notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(prompt)
    }

    /// Find a user's prompt by its public sequence number.
    pub async fn find_by_seq(
        pool: &PgPool,
        user_id: DbId,
        seq: DbId,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE user_id = $1 AND seq = $2");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(user_id)
            .bind(seq)
            .fetch_optional(pool)
            .await
    }

    /// List a user's prompts with pagination, oldest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts
             WHERE user_id = $1
             ORDER BY seq
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a user's prompts (tier-limit input).
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM prompts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update a prompt. Only non-`None` fields in `input` are applied; a
    /// present tag list replaces the stored collection whole.
    ///
    /// Returns `None` if the user has no prompt with that sequence number.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        seq: DbId,
        input: &UpdatePrompt,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!(
            "UPDATE prompts SET
                title = COALESCE($3, title),
                tags = COALESCE($4, tags),
                updated_at = now()
             WHERE user_id = $1 AND seq = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(user_id)
            .bind(seq)
            .bind(&input.title)
            .bind(input.tags.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Rewrite a prompt's whole tag collection by primary key.
    pub async fn update_tags(
        pool: &PgPool,
        prompt_id: DbId,
        tags: &[PromptTag],
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!(
            "UPDATE prompts SET tags = $2, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(prompt_id)
            .bind(Json(tags))
            .fetch_optional(pool)
            .await
    }

    /// Delete a user's prompt; versions cascade. Returns `true` if a row
    /// was deleted.
    pub async fn delete(pool: &PgPool, user_id: DbId, seq: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompts WHERE user_id = $1 AND seq = $2")
            .bind(user_id)
            .bind(seq)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
