//! Route definitions, one module per API area.

pub mod api_keys;
pub mod billing;
pub mod health;
pub mod playground;
pub mod prompts;
pub mod tier;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/prompts", prompts::router())
        .nest("/user/api-keys", api_keys::router())
        .nest("/user/tier", tier::router())
        .nest("/billing", billing::router())
        .nest("/playground", playground::router())
}
