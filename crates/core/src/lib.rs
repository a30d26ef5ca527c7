//! Domain logic for the playlist loader.
//!
//! Everything here is free of database and HTTP concerns so it can be shared
//! by the repository layer, the API server, and tests.

pub mod annotation;
pub mod error;
pub mod playlist_file;
pub mod timeslot;
pub mod types;
pub mod url_normalizer;
