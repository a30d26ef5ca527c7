//! Playlist entity model and DTOs.

use pload_core::types::{DbId, Timestamp, AUTOMATION_DJ_ID};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `playlists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Playlist {
    pub id: DbId,
    pub timeslot_start: Timestamp,
    pub timeslot_end: Timestamp,
    pub queue: Option<String>,
    pub dj_id: Option<DbId>,
    pub uploader: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Playlist {
    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }

    /// The DJ credited for this playlist; unassigned playlists belong to automation.
    pub fn effective_dj_id(&self) -> DbId {
        self.dj_id.unwrap_or(AUTOMATION_DJ_ID)
    }
}

/// DTO for creating a new playlist.
#[derive(Debug, Clone)]
pub struct CreatePlaylist {
    pub timeslot_start: Timestamp,
    pub timeslot_end: Timestamp,
    pub queue: Option<String>,
    pub dj_id: Option<DbId>,
    pub uploader: Option<String>,
}

/// A playlist together with its track counts, for schedule overviews.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlaylistSummary {
    pub id: DbId,
    pub timeslot_start: Timestamp,
    pub timeslot_end: Timestamp,
    pub queue: Option<String>,
    pub dj_id: Option<DbId>,
    pub uploader: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub track_count: i64,
    pub unplayed_count: i64,
}
