//! Route definitions for per-provider API key management.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::api_keys;
use crate::state::AppState;

/// API key routes mounted at `/user/api-keys`.
///
/// ```text
/// GET    /            -> list_api_keys
/// POST   /            -> create_api_key
/// PUT    /{provider}  -> update_api_key
/// DELETE /{provider}  -> delete_api_key
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/{provider}",
            put(api_keys::update_api_key).delete(api_keys::delete_api_key),
        )
}
