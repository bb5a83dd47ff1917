//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use promptstash_core::error::CoreError;
use promptstash_db::models::user::User;
use promptstash_db::repositories::UserRepo;

use crate::auth::token::{fallback_username, verify_bearer};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a bearer token in the `Authorization`
/// header.
///
/// Verification resolves the token against the identity provider's signing
/// keys, then maps the verified subject to the local user row — creating it
/// on first sight (idempotent upsert). Use as an extractor parameter in any
/// handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = verify_bearer(token, &state.jwks, &state.config.auth0).await?;

        let user = UserRepo::upsert_by_auth0_id(
            &state.pool,
            &claims.sub,
            claims.email.as_deref(),
            &fallback_username(&claims),
        )
        .await?;

        Ok(AuthUser(user))
    }
}
