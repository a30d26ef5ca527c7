//! Route definitions for the automation dispense endpoint.

use axum::routing::get;
use axum::Router;

use crate::handlers::dispense;
use crate::state::AppState;

/// ```text
/// GET /next_track   -> next_track  (?prerecorded=1)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/next_track", get(dispense::next_track))
}
