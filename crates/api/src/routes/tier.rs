//! Route definition for the tier-info read endpoint.

use axum::routing::get;
use axum::Router;

use crate::handlers::tier;
use crate::state::AppState;

/// Tier routes mounted at `/user/tier`.
///
/// ```text
/// GET / -> get_tier_info
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(tier::get_tier_info))
}
