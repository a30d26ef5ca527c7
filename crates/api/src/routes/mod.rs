pub mod dispense;
pub mod health;
pub mod lookup;
pub mod playlist;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /next_track                     dispense next track (automation basic auth)
///
/// /validate_track                 normalize one URL (GET)
/// /search                         search the track index (GET)
/// /djs                            DJ roster (GET)
/// /time_slots                     named time slots (GET)
///
/// /playlists                      upload (POST)
/// /playlists/upcoming             schedule overview (GET)
/// /playlists/{id}                 detail (GET), invalidate (DELETE)
/// /playlists/{id}/tracks          replace track list (PUT)
/// /playlists/{id}/restore         undo invalidate (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(dispense::router())
        .merge(lookup::router())
        .route("/time_slots", get(handlers::playlist::list_time_slots))
        .nest("/playlists", playlist::router())
}
