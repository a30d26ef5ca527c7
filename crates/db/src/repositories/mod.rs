//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod playlist_repo;
pub mod track_repo;

pub use playlist_repo::{
    InvalidateOutcome, PlaylistRepo, ReplaceOutcome, RestoreOutcome, TrackEditOutcome,
};
pub use track_repo::TrackRepo;
