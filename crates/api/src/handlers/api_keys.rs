//! Per-provider API key handlers.
//!
//! The plaintext key exists only inside the request: it is encrypted before
//! storage and only the masked preview ever appears in a response or a log
//! line.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::error::CoreError;
use promptstash_core::secrets::mask_key;
use promptstash_db::models::api_key::{CreateUserApiKey, UpdateUserApiKey};
use promptstash_db::repositories::ApiKeyRepo;

use crate::clients::llm::LlmProvider;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn parse_provider(name: &str) -> Result<LlmProvider, AppError> {
    LlmProvider::parse(name).ok_or_else(|| {
        let supported: Vec<&str> = LlmProvider::ALL.iter().map(|p| p.as_str()).collect();
        AppError::Core(CoreError::Validation(format!(
            "Unknown provider '{name}'. Supported providers: {}",
            supported.join(", ")
        )))
    })
}

/// POST /api/v1/user/api-keys
///
/// Store a provider key for the caller. One key per (user, provider); a
/// duplicate is a 409.
pub async fn create_api_key(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateUserApiKey>,
) -> AppResult<impl IntoResponse> {
    let provider = parse_provider(&input.provider)?;
    if input.api_key.trim().is_empty() {
        return Err(AppError::BadRequest("api_key must not be empty".into()));
    }

    let cipher = state.cipher()?;
    let encrypted = cipher.encrypt(&input.api_key)?;
    let masked = mask_key(&input.api_key);

    let key = ApiKeyRepo::create(&state.pool, user.id, provider.as_str(), &encrypted, &masked)
        .await?;

    tracing::info!(
        user_id = user.id,
        provider = provider.as_str(),
        masked_key = %key.masked_key,
        "API key stored",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: key })))
}

/// GET /api/v1/user/api-keys
///
/// List the caller's stored keys. Masked previews only.
pub async fn list_api_keys(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let keys = ApiKeyRepo::list_for_user(&state.pool, user.id).await?;
    Ok(Json(DataResponse { data: keys }))
}

/// PUT /api/v1/user/api-keys/{provider}
///
/// Rotate the stored key for one provider: new ciphertext, new mask.
pub async fn update_api_key(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(input): Json<UpdateUserApiKey>,
) -> AppResult<impl IntoResponse> {
    let provider = parse_provider(&provider)?;
    if input.api_key.trim().is_empty() {
        return Err(AppError::BadRequest("api_key must not be empty".into()));
    }

    let cipher = state.cipher()?;
    let encrypted = cipher.encrypt(&input.api_key)?;
    let masked = mask_key(&input.api_key);

    let key = ApiKeyRepo::rotate(&state.pool, user.id, provider.as_str(), &encrypted, &masked)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("ApiKey", provider.as_str())))?;

    tracing::info!(
        user_id = user.id,
        provider = provider.as_str(),
        "API key rotated",
    );

    Ok(Json(DataResponse { data: key }))
}

/// DELETE /api/v1/user/api-keys/{provider}
pub async fn delete_api_key(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    let provider = parse_provider(&provider)?;

    let deleted = ApiKeyRepo::delete(&state.pool, user.id, provider.as_str()).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::not_found(
            "ApiKey",
            provider.as_str(),
        )));
    }

    tracing::info!(
        user_id = user.id,
        provider = provider.as_str(),
        "API key deleted",
    );

    Ok(StatusCode::NO_CONTENT)
}
