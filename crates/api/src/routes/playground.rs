//! Route definition for the LLM playground.

use axum::routing::post;
use axum::Router;

use crate::handlers::playground;
use crate::state::AppState;

/// Playground routes mounted at `/playground`.
///
/// ```text
/// POST /generate -> generate
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(playground::generate))
}
