//! Version handlers: append a version, edit its notes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::error::CoreError;
use promptstash_core::naming::{parse_version_label, version_label};
use promptstash_core::tier::{self, Tier};
use promptstash_db::models::prompt_version::{CreatePromptVersion, UpdateVersionNotes};
use promptstash_db::repositories::PromptVersionRepo;

use crate::clients::llm::LlmProvider;
use crate::error::{AppError, AppResult};
use crate::handlers::prompts::{load_prompt, VersionResponse};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/prompts/{prompt_id}/versions
///
/// Append a new version and move `latest_version` to it. Gated by the
/// caller's tier (versions-per-prompt ceiling).
pub async fn create_version(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
    Json(input): Json<CreatePromptVersion>,
) -> AppResult<impl IntoResponse> {
    if let Some(provider) = &input.llm_provider {
        if LlmProvider::parse(provider).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown provider '{provider}'"
            ))));
        }
    }

    let prompt = load_prompt(&state, user.id, &prompt_id).await?;

    let version_count = PromptVersionRepo::count_for_prompt(&state.pool, prompt.id).await?;
    tier::check_version_creation(
        Tier::parse(&user.tier),
        &user.subscription_status,
        version_count,
    )?;

    let version = PromptVersionRepo::create(&state.pool, prompt.id, &input).await?;

    tracing::info!(
        prompt = %prompt_id,
        version = %version_label(version.version),
        user_id = user.id,
        "Version created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: VersionResponse::from(version),
        }),
    ))
}

/// PUT /api/v1/prompts/{prompt_id}/versions/{version_id}/notes
///
/// Overwrite a version's notes — the only field mutable after creation.
pub async fn update_version_notes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((prompt_id, version_id)): Path<(String, String)>,
    Json(input): Json<UpdateVersionNotes>,
) -> AppResult<impl IntoResponse> {
    let prompt = load_prompt(&state, user.id, &prompt_id).await?;

    let version_number = parse_version_label(&version_id)
        .ok_or_else(|| AppError::Core(CoreError::not_found("Version", &version_id)))?;

    let version =
        PromptVersionRepo::update_notes(&state.pool, prompt.id, version_number, input.notes.as_deref())
            .await?
            .ok_or_else(|| AppError::Core(CoreError::not_found("Version", &version_id)))?;

    Ok(Json(DataResponse {
        data: VersionResponse::from(version),
    }))
}
