//! Creating, overwriting, editing, invalidating and restoring playlists.
//!
//! Every upload line is normalized before anything is written. If any line
//! fails, the caller gets a per-line report and the schedule is untouched;
//! otherwise the playlist and all of its tracks are written in one
//! transaction by the repository layer.

use futures::stream::{self, StreamExt};
use pload_core::error::CoreError;
use pload_core::playlist_file::{parse_lines, PlaylistLine};
use pload_core::types::{DbId, Timestamp};
use pload_core::url_normalizer::UrlNormalizer;
use pload_db::models::playlist::{CreatePlaylist, Playlist};
use pload_db::repositories::{
    InvalidateOutcome, PlaylistRepo, ReplaceOutcome, RestoreOutcome, TrackEditOutcome,
    TrackRepo,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Upper bound on reachability probes in flight for one upload.
const PROBE_CONCURRENCY: usize = 8;

// ---------------------------------------------------------------------------
// Requests and reports
// ---------------------------------------------------------------------------

/// Where and how a new playlist should be scheduled.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub timeslot_start: Timestamp,
    pub timeslot_end: Timestamp,
    pub queue: Option<String>,
    pub dj_id: Option<DbId>,
    pub uploader: Option<String>,
    /// Replace approved playlists overlapping the slot instead of failing.
    pub overwrite: bool,
    /// Accept non-URL lines verbatim and skip reachability probes.
    pub skip_validate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Ok,
    Error,
}

/// Validation result for one playlist line.
#[derive(Debug, Clone, Serialize)]
pub struct LineResult {
    /// 1-based index among non-comment lines.
    pub index: usize,
    /// The normalized URL, or the raw line if it failed.
    pub url: String,
    pub status: LineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of an upload or track replacement.
///
/// `ok = false` means at least one line failed and nothing was written.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub ok: bool,
    pub playlist_id: Option<DbId>,
    pub timeslot_start: Timestamp,
    pub timeslot_end: Timestamp,
    /// Ids of playlists deleted by an overwrite.
    pub replaced: Vec<DbId>,
    pub lines: Vec<LineResult>,
}

// ---------------------------------------------------------------------------
// PlaylistScheduler
// ---------------------------------------------------------------------------

/// Lifecycle and dispense operations over the playlist schedule.
pub struct PlaylistScheduler {
    pub(crate) pool: PgPool,
    normalizer: UrlNormalizer,
}

impl PlaylistScheduler {
    pub fn new(pool: PgPool, normalizer: UrlNormalizer) -> Self {
        Self { pool, normalizer }
    }

    /// Schedule a new approved playlist from an uploaded file body.
    ///
    /// 1. Validate the slot and refuse an occupied one unless overwriting.
    /// 2. Normalize every line; stop with a rejected report if any fails.
    /// 3. Atomically delete overlapped playlists (if overwriting), then
    ///    insert the playlist and its tracks.
    pub async fn create_or_replace(
        &self,
        request: &SlotRequest,
        body: &str,
    ) -> AppResult<UploadReport> {
        if request.timeslot_end <= request.timeslot_start {
            return Err(CoreError::Validation(
                "time slot must end after it starts".into(),
            )
            .into());
        }
        if let Some(dj_id) = request.dj_id {
            if dj_id < 1 {
                return Err(CoreError::Validation(format!("invalid DJ id {dj_id}")).into());
            }
        }
        let lines = parse_lines(body);
        if lines.is_empty() {
            return Err(CoreError::Validation("playlist contains no tracks".into()).into());
        }

        // 1. Cheap read-only check so a taken slot fails before any probing.
        // The transactional check in step 3 is authoritative.
        if !request.overwrite {
            let existing = PlaylistRepo::find_overlapping(
                &self.pool,
                request.timeslot_start,
                request.timeslot_end,
                request.queue.as_deref(),
                None,
            )
            .await?;
            if !existing.is_empty() {
                return Err(CoreError::PlaylistExists.into());
            }
        }

        // 2. Normalize.
        let (results, urls) = self.normalize_lines(&lines, request.skip_validate).await;
        let Some(urls) = urls else {
            tracing::info!(
                failed = results.iter().filter(|r| r.status == LineStatus::Error).count(),
                "Rejected playlist upload"
            );
            return Ok(UploadReport {
                ok: false,
                playlist_id: None,
                timeslot_start: request.timeslot_start,
                timeslot_end: request.timeslot_end,
                replaced: Vec::new(),
                lines: results,
            });
        };

        // 3. Write.
        let input = CreatePlaylist {
            timeslot_start: request.timeslot_start,
            timeslot_end: request.timeslot_end,
            queue: request.queue.clone(),
            dj_id: request.dj_id,
            uploader: request.uploader.clone(),
        };
        let outcome =
            PlaylistRepo::replace_slot(&self.pool, &input, &urls, request.overwrite).await?;

        match outcome {
            ReplaceOutcome::Created {
                playlist,
                tracks,
                replaced,
            } => {
                tracing::warn!(
                    playlist_id = playlist.id,
                    uploader = ?playlist.uploader,
                    queue = ?playlist.queue,
                    start = %playlist.timeslot_start,
                    end = %playlist.timeslot_end,
                    tracks = tracks.len(),
                    replaced = ?replaced,
                    "Playlist uploaded"
                );
                Ok(UploadReport {
                    ok: true,
                    playlist_id: Some(playlist.id),
                    timeslot_start: playlist.timeslot_start,
                    timeslot_end: playlist.timeslot_end,
                    replaced,
                    lines: results,
                })
            }
            ReplaceOutcome::Conflict { .. } => Err(CoreError::PlaylistExists.into()),
            ReplaceOutcome::Locked { playlist_id } => {
                Err(CoreError::PlaylistLocked { id: playlist_id }.into())
            }
        }
    }

    /// Replace the whole track list of a playlist that has not started airing.
    ///
    /// The playlist's slot is unchanged, so overlap is not re-checked.
    pub async fn edit(&self, id: DbId, body: &str, skip_validate: bool) -> AppResult<UploadReport> {
        let playlist = self.find(id).await?;

        let lines = parse_lines(body);
        if lines.is_empty() {
            return Err(CoreError::Validation("playlist contains no tracks".into()).into());
        }
        // Refuse before probing; the transaction re-checks under lock.
        let current = TrackRepo::list_by_playlist(&self.pool, id).await?;
        if current.iter().any(|t| t.played) {
            return Err(CoreError::PlaylistLocked { id }.into());
        }

        let (results, urls) = self.normalize_lines(&lines, skip_validate).await;
        let Some(urls) = urls else {
            return Ok(UploadReport {
                ok: false,
                playlist_id: Some(id),
                timeslot_start: playlist.timeslot_start,
                timeslot_end: playlist.timeslot_end,
                replaced: Vec::new(),
                lines: results,
            });
        };

        match PlaylistRepo::replace_tracks(&self.pool, id, &urls).await? {
            TrackEditOutcome::Replaced(tracks) => {
                tracing::info!(playlist_id = id, tracks = tracks.len(), "Replaced playlist tracks");
                Ok(UploadReport {
                    ok: true,
                    playlist_id: Some(id),
                    timeslot_start: playlist.timeslot_start,
                    timeslot_end: playlist.timeslot_end,
                    replaced: Vec::new(),
                    lines: results,
                })
            }
            TrackEditOutcome::NotFound => Err(not_found(id)),
            TrackEditOutcome::Locked => Err(CoreError::PlaylistLocked { id }.into()),
        }
    }

    /// Clear a playlist's approval so it no longer airs. Reversible with
    /// [`restore`](Self::restore).
    pub async fn invalidate(&self, id: DbId) -> AppResult<Playlist> {
        match PlaylistRepo::invalidate(&self.pool, id).await? {
            InvalidateOutcome::Invalidated(playlist) => {
                tracing::info!(playlist_id = id, "Invalidated playlist");
                Ok(playlist)
            }
            InvalidateOutcome::NotFound => Err(not_found(id)),
            InvalidateOutcome::Locked => Err(CoreError::PlaylistLocked { id }.into()),
        }
    }

    /// Re-approve an invalidated playlist if its slot is still free.
    pub async fn restore(&self, id: DbId) -> AppResult<Playlist> {
        match PlaylistRepo::restore(&self.pool, id).await? {
            RestoreOutcome::Restored(playlist) => {
                tracing::info!(playlist_id = id, "Restored playlist");
                Ok(playlist)
            }
            RestoreOutcome::NotFound => Err(not_found(id)),
            RestoreOutcome::Conflict { existing } => {
                tracing::info!(playlist_id = id, ?existing, "Restore blocked by newer playlist");
                Err(CoreError::PlaylistExists.into())
            }
        }
    }

    /// Normalize a single URL without storing anything.
    pub async fn validate(&self, url: &str, skip_validate: bool) -> Result<String, CoreError> {
        self.normalizer.normalize(url, skip_validate).await
    }

    pub async fn find(&self, id: DbId) -> AppResult<Playlist> {
        PlaylistRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Normalize all lines, preserving order.
    ///
    /// Returns the per-line report, and the normalized URLs only if every
    /// line passed.
    async fn normalize_lines(
        &self,
        lines: &[PlaylistLine<'_>],
        skip_validate: bool,
    ) -> (Vec<LineResult>, Option<Vec<String>>) {
        let outcomes: Vec<_> = stream::iter(lines)
            .map(|line| async move {
                (line, self.normalizer.normalize(line.url, skip_validate).await)
            })
            .buffered(PROBE_CONCURRENCY)
            .boxed()
            .collect()
            .await;

        let mut all_ok = true;
        let results: Vec<LineResult> = outcomes
            .into_iter()
            .map(|(line, outcome)| match outcome {
                Ok(url) => LineResult {
                    index: line.index,
                    url,
                    status: LineStatus::Ok,
                    error: None,
                },
                Err(e) => {
                    all_ok = false;
                    LineResult {
                        index: line.index,
                        url: line.url.to_string(),
                        status: LineStatus::Error,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let urls = all_ok.then(|| results.iter().map(|r| r.url.clone()).collect());
        (results, urls)
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Playlist",
        id,
    })
}
