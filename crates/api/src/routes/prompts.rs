//! Route definitions for prompts, versions, and tags.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{prompts, tags, versions};
use crate::state::AppState;

/// Prompt routes mounted at `/prompts`.
///
/// ```text
/// GET    /                                        -> list_prompts
/// POST   /                                        -> create_prompt
/// GET    /{prompt_id}                             -> get_prompt
/// PUT    /{prompt_id}                             -> update_prompt
/// DELETE /{prompt_id}                             -> delete_prompt
/// POST   /{prompt_id}/versions                    -> create_version
/// PUT    /{prompt_id}/versions/{version_id}/notes -> update_version_notes
/// POST   /{prompt_id}/tags                        -> add_tag
/// DELETE /{prompt_id}/tags/{tag_name}             -> remove_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(prompts::list_prompts).post(prompts::create_prompt))
        .route(
            "/{prompt_id}",
            get(prompts::get_prompt)
                .put(prompts::update_prompt)
                .delete(prompts::delete_prompt),
        )
        .route("/{prompt_id}/versions", post(versions::create_version))
        .route(
            "/{prompt_id}/versions/{version_id}/notes",
            put(versions::update_version_notes),
        )
        .route("/{prompt_id}/tags", post(tags::add_tag))
        .route("/{prompt_id}/tags/{tag_name}", delete(tags::remove_tag))
}
