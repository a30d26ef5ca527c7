use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// An approved playlist in the same queue overlaps the requested slot.
    #[error("A playlist already exists for that time slot")]
    PlaylistExists,

    /// The playlist has at least one track that already aired.
    #[error("Playlist {id} has already started playing")]
    PlaylistLocked { id: DbId },

    /// A track URL failed normalization or validation.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
