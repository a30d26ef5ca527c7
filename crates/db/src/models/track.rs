//! Track entity model.

use pload_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tracks` table.
///
/// `position` is the 1-based order within the owning playlist and is the
/// order in which tracks are dispensed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Track {
    pub id: DbId,
    pub playlist_id: DbId,
    pub position: i32,
    pub url: String,
    pub played: bool,
    pub played_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
