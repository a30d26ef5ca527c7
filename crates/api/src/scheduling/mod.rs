//! Playlist scheduling service.
//!
//! [`PlaylistScheduler`] owns the upload/edit/invalidate lifecycle and the
//! dispense path. It is held in [`AppState`](crate::state::AppState) as an
//! `Arc<PlaylistScheduler>`.

pub mod dispense;
pub mod lifecycle;

pub use lifecycle::{LineResult, LineStatus, PlaylistScheduler, SlotRequest, UploadReport};
