//! Tag handlers.
//!
//! The tag list is one JSONB collection rewritten whole on every mutation:
//! adding an existing name updates its color in place, removing an absent
//! name is a no-op.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::error::CoreError;
use promptstash_core::tags::{self, PromptTag};
use promptstash_db::repositories::{PromptRepo, PromptVersionRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::prompts::{load_prompt, PromptResponse};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/prompts/{prompt_id}/tags
///
/// Add a tag, or recolor an existing tag with the same name.
pub async fn add_tag(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
    Json(tag): Json<PromptTag>,
) -> AppResult<impl IntoResponse> {
    if tag.name.trim().is_empty() {
        return Err(AppError::BadRequest("Tag name cannot be empty".into()));
    }

    let prompt = load_prompt(&state, user.id, &prompt_id).await?;

    let mut new_tags = prompt.tags.0.clone();
    tags::upsert_tag(&mut new_tags, tag);

    let updated = PromptRepo::update_tags(&state.pool, prompt.id, &new_tags)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", &prompt_id)))?;

    let versions = PromptVersionRepo::list_for_prompt(&state.pool, updated.id).await?;
    Ok(Json(DataResponse {
        data: PromptResponse::assemble(updated, versions),
    }))
}

/// DELETE /api/v1/prompts/{prompt_id}/tags/{tag_name}
///
/// Remove a tag by name. Removing a name the prompt does not carry leaves
/// the list unchanged and still returns the prompt.
pub async fn remove_tag(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((prompt_id, tag_name)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let prompt = load_prompt(&state, user.id, &prompt_id).await?;

    let mut new_tags = prompt.tags.0.clone();
    let removed = tags::remove_tag(&mut new_tags, &tag_name);

    let prompt = if removed {
        PromptRepo::update_tags(&state.pool, prompt.id, &new_tags)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", &prompt_id)))?
    } else {
        prompt
    };

    let versions = PromptVersionRepo::list_for_prompt(&state.pool, prompt.id).await?;
    Ok(Json(DataResponse {
        data: PromptResponse::assemble(prompt, versions),
    }))
}
