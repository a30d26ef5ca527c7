//! The on-air dispense path: resolve the active playlist, claim its next
//! track, attribute it to the playlist's DJ.

use pload_core::annotation::attribute_to_dj;
use pload_core::types::Timestamp;
use pload_db::repositories::{PlaylistRepo, TrackRepo};

use super::PlaylistScheduler;
use crate::error::AppResult;

impl PlaylistScheduler {
    /// Claim the next track due at `now` in `queue`.
    ///
    /// Returns `None` when no playlist is on air or the active one is
    /// exhausted. Each track is returned at most once, however many callers
    /// race.
    pub async fn dispense(&self, now: Timestamp, queue: Option<&str>) -> AppResult<Option<String>> {
        let Some(playlist) = PlaylistRepo::find_active(&self.pool, now, queue).await? else {
            tracing::debug!(queue = ?queue, "No playlist on air");
            return Ok(None);
        };

        let Some(track) = TrackRepo::claim_next(&self.pool, playlist.id).await? else {
            tracing::debug!(playlist_id = playlist.id, "Active playlist is exhausted");
            return Ok(None);
        };

        tracing::info!(
            playlist_id = playlist.id,
            track_id = track.id,
            position = track.position,
            "Dispensed track"
        );
        Ok(Some(attribute_to_dj(&track.url, playlist.dj_id)))
    }
}
