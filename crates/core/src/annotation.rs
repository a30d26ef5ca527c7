//! DJ attribution wrapper for dispensed track URLs.
//!
//! Playback tooling understands `annotate:<key>=<value>:<uri>` prefixes and
//! forwards the key/value pair as track metadata. A dispensed track from a
//! human DJ's playlist is wrapped so the play log can credit that DJ.

use crate::types::{DbId, AUTOMATION_DJ_ID};

/// Annotation key carrying the roster id of the DJ.
pub const DJ_ANNOTATION_KEY: &str = "trackman_dj_id";

/// Wrap `url` with the DJ annotation when the playlist belongs to a human DJ.
///
/// Playlists without a DJ, or owned by [`AUTOMATION_DJ_ID`], return the URL
/// unchanged.
pub fn attribute_to_dj(url: &str, dj_id: Option<DbId>) -> String {
    match dj_id {
        Some(id) if id != AUTOMATION_DJ_ID => {
            format!("annotate:{DJ_ANNOTATION_KEY}={id}:{url}")
        }
        _ => url.to_string(),
    }
}
