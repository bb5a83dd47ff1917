//! Tier-info read handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use promptstash_core::tier::{Tier, TierInfo};
use promptstash_db::repositories::PromptRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/user/tier
///
/// Report the caller's effective tier, usage, and ceilings.
pub async fn get_tier_info(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let prompt_count = PromptRepo::count_for_user(&state.pool, user.id).await?;

    let info = TierInfo::compute(
        Tier::parse(&user.tier),
        &user.subscription_status,
        prompt_count,
    );

    Ok(Json(DataResponse { data: info }))
}
