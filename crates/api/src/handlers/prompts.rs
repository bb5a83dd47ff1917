//! Prompt CRUD handlers and the shared prompt response shape.
//!
//! Prompts are addressed by their public identifier (`prompt{seq}`); every
//! query is scoped to the authenticated user. Responses render the version
//! history as a map keyed by version label, with `latest_version` always
//! naming the highest.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::error::CoreError;
use promptstash_core::naming::{parse_prompt_id, prompt_public_id, version_label};
use promptstash_core::tags::PromptTag;
use promptstash_core::tier::{self, Tier};
use promptstash_core::types::{DbId, Timestamp};
use promptstash_db::models::prompt::{CreatePrompt, Prompt, UpdatePrompt};
use promptstash_db::models::prompt_version::PromptVersion;
use promptstash_db::repositories::{PromptRepo, PromptVersionRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// One version entry in a prompt response.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    /// Version label, e.g. `v2`.
    pub id: String,
    pub version: i32,
    pub text: String,
    pub notes: Option<String>,
    pub llm_provider: Option<String>,
    pub model_id: Option<String>,
    pub created_at: Timestamp,
}

impl From<PromptVersion> for VersionResponse {
    fn from(v: PromptVersion) -> Self {
        VersionResponse {
            id: version_label(v.version),
            version: v.version,
            text: v.body,
            notes: v.notes,
            llm_provider: v.llm_provider,
            model_id: v.model_id,
            created_at: v.created_at,
        }
    }
}

/// Full prompt response: public id, tags, and the whole version history.
#[derive(Debug, Serialize)]
pub struct PromptResponse {
    /// Public identifier, e.g. `prompt3`.
    pub id: String,
    pub title: String,
    pub tags: Vec<PromptTag>,
    /// Version label -> version entry.
    pub versions: BTreeMap<String, VersionResponse>,
    /// Label of the highest version, e.g. `v2`.
    pub latest_version: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PromptResponse {
    /// Shape a prompt row plus its version rows into the API response.
    pub fn assemble(prompt: Prompt, versions: Vec<PromptVersion>) -> PromptResponse {
        let versions: BTreeMap<String, VersionResponse> = versions
            .into_iter()
            .map(|v| (version_label(v.version), VersionResponse::from(v)))
            .collect();

        PromptResponse {
            id: prompt_public_id(prompt.seq),
            title: prompt.title,
            tags: prompt.tags.0,
            versions,
            latest_version: version_label(prompt.latest_version),
            created_at: prompt.created_at,
            updated_at: prompt.updated_at,
        }
    }
}

/// Load a prompt row plus versions and shape the response.
async fn assemble_response(state: &AppState, prompt: Prompt) -> AppResult<PromptResponse> {
    let versions = PromptVersionRepo::list_for_prompt(&state.pool, prompt.id).await?;
    Ok(PromptResponse::assemble(prompt, versions))
}

/// Resolve a public prompt id to the caller's row, or 404.
pub(crate) async fn load_prompt(
    state: &AppState,
    user_id: DbId,
    prompt_id: &str,
) -> AppResult<Prompt> {
    let seq = parse_prompt_id(prompt_id)
        .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", prompt_id)))?;
    PromptRepo::find_by_seq(&state.pool, user_id, seq)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", prompt_id)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// GET /api/v1/prompts
///
/// List the caller's prompts with their version histories.
pub async fn list_prompts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let prompts =
        PromptRepo::list_for_user(&state.pool, user.id, params.limit, params.skip).await?;

    let mut responses = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        responses.push(assemble_response(&state, prompt).await?);
    }

    Ok(Json(DataResponse { data: responses }))
}

/// POST /api/v1/prompts
///
/// Create a prompt with its initial version. Gated by the caller's tier.
pub async fn create_prompt(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePrompt>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let prompt_count = PromptRepo::count_for_user(&state.pool, user.id).await?;
    tier::check_prompt_creation(
        Tier::parse(&user.tier),
        &user.subscription_status,
        prompt_count,
    )?;

    let prompt = PromptRepo::create(&state.pool, user.id, &input).await?;

    tracing::info!(
        prompt = %prompt_public_id(prompt.seq),
        user_id = user.id,
        "Prompt created",
    );

    let response = assemble_response(&state, prompt).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// GET /api/v1/prompts/{prompt_id}
pub async fn get_prompt(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let prompt = load_prompt(&state, user.id, &prompt_id).await?;
    let response = assemble_response(&state, prompt).await?;
    Ok(Json(DataResponse { data: response }))
}

/// PUT /api/v1/prompts/{prompt_id}
///
/// Patch a prompt's title and/or replace its whole tag list.
pub async fn update_prompt(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
    Json(input): Json<UpdatePrompt>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("title must not be empty".into()));
        }
    }

    let seq = parse_prompt_id(&prompt_id)
        .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", &prompt_id)))?;
    let prompt = PromptRepo::update(&state.pool, user.id, seq, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", &prompt_id)))?;

    let response = assemble_response(&state, prompt).await?;
    Ok(Json(DataResponse { data: response }))
}

/// DELETE /api/v1/prompts/{prompt_id}
///
/// Delete a prompt; its versions cascade.
pub async fn delete_prompt(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let seq = parse_prompt_id(&prompt_id)
        .ok_or_else(|| AppError::Core(CoreError::not_found("Prompt", &prompt_id)))?;
    let deleted = PromptRepo::delete(&state.pool, user.id, seq).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::not_found("Prompt", &prompt_id)));
    }

    tracing::info!(prompt = %prompt_id, user_id = user.id, "Prompt deleted");
    Ok(StatusCode::NO_CONTENT)
}
