//! Route definitions for the `/playlists` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::playlist;
use crate::state::AppState;

/// Routes mounted at `/playlists`.
///
/// ```text
/// POST   /                 -> upload
/// GET    /upcoming         -> list_upcoming
/// GET    /{id}             -> get_playlist
/// DELETE /{id}             -> invalidate
/// PUT    /{id}/tracks      -> replace_tracks
/// POST   /{id}/restore     -> restore
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(playlist::upload))
        .route("/upcoming", get(playlist::list_upcoming))
        .route(
            "/{id}",
            get(playlist::get_playlist).delete(playlist::invalidate),
        )
        .route("/{id}/tracks", put(playlist::replace_tracks))
        .route("/{id}/restore", post(playlist::restore))
}
