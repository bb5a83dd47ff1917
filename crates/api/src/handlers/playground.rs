//! Playground handler: forward a prompt to a provider with the caller's
//! own stored key.
//!
//! Expected generation failures (no stored key, unknown model, blocked
//! content, rate limits) come back as a 200 with a stable `error_code`
//! instead of an HTTP error, so the UI can branch without status-code
//! gymnastics.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::error::CoreError;
use promptstash_db::repositories::ApiKeyRepo;
use serde::{Deserialize, Serialize};

use crate::clients::llm::{codes, LlmError, LlmProvider};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub provider: String,
    pub model: String,
    pub prompt_text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub error_code: Option<String>,
    pub error: Option<String>,
}

impl GenerateResponse {
    fn ok(text: String) -> Self {
        GenerateResponse {
            text: Some(text),
            error_code: None,
            error: None,
        }
    }

    fn err(e: LlmError) -> Self {
        GenerateResponse {
            text: None,
            error_code: Some(e.code.to_string()),
            error: Some(e.message),
        }
    }
}

/// POST /api/v1/playground/generate
pub async fn generate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    if request.model.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "model must not be empty".into(),
        )));
    }
    if request.prompt_text.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "prompt_text must not be empty".into(),
        )));
    }

    let Some(provider) = LlmProvider::parse(&request.provider) else {
        return Ok(Json(DataResponse {
            data: GenerateResponse::err(LlmError::new(
                codes::UNKNOWN_PROVIDER,
                format!("Unknown provider '{}'", request.provider),
            )),
        }));
    };

    // Bring-your-own-key: the caller must have stored a key for this provider.
    let Some(key_row) =
        ApiKeyRepo::find_by_provider(&state.pool, user.id, provider.as_str()).await?
    else {
        return Ok(Json(DataResponse {
            data: GenerateResponse::err(LlmError::new(
                codes::MISSING_API_KEY,
                format!(
                    "No API key stored for provider '{}'. Add one in settings.",
                    provider.as_str()
                ),
            )),
        }));
    };

    let cipher = state.cipher()?;
    let api_key = cipher.decrypt(&key_row.encrypted_key)?;

    let result = state
        .llm
        .generate(provider, &api_key, &request.model, &request.prompt_text)
        .await;

    let data = match result {
        Ok(text) => GenerateResponse::ok(text),
        Err(e) => {
            tracing::info!(
                user_id = user.id,
                provider = provider.as_str(),
                error_code = e.code,
                "Playground generation failed",
            );
            GenerateResponse::err(e)
        }
    };

    Ok(Json(DataResponse { data }))
}
