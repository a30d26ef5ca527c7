//! Route definitions for validation, search and roster lookups.

use axum::routing::get;
use axum::Router;

use crate::handlers::lookup;
use crate::state::AppState;

/// ```text
/// GET /validate_track   -> validate_track  (?url=&skip_validate=)
/// GET /search           -> search          (?q=)
/// GET /djs              -> list_djs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate_track", get(lookup::validate_track))
        .route("/search", get(lookup::search))
        .route("/djs", get(lookup::list_djs))
}
