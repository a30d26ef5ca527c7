//! Repository for the `playlists` table.
//!
//! Every schedule mutation (create/overwrite, track replacement, invalidate,
//! restore) runs in one transaction that first takes a table lock on
//! `playlists`, so overlap checks and the writes they guard cannot interleave.
//! The dispense claim never takes that lock.

use pload_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::playlist::{CreatePlaylist, Playlist, PlaylistSummary};
use crate::models::track::Track;
use crate::repositories::TrackRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, timeslot_start, timeslot_end, queue, dj_id, uploader, \
    approved_at, created_at, updated_at";

/// Result of [`PlaylistRepo::replace_slot`].
#[derive(Debug)]
pub enum ReplaceOutcome {
    /// The playlist was created; `replaced` lists overwritten playlist ids.
    Created {
        playlist: Playlist,
        tracks: Vec<Track>,
        replaced: Vec<DbId>,
    },
    /// Approved playlists overlap the slot and overwrite was not requested.
    Conflict { existing: Vec<DbId> },
    /// An overlapping playlist has already aired tracks and cannot be overwritten.
    Locked { playlist_id: DbId },
}

/// Result of [`PlaylistRepo::replace_tracks`].
#[derive(Debug)]
pub enum TrackEditOutcome {
    Replaced(Vec<Track>),
    NotFound,
    Locked,
}

/// Result of [`PlaylistRepo::invalidate`].
#[derive(Debug)]
pub enum InvalidateOutcome {
    Invalidated(Playlist),
    NotFound,
    Locked,
}

/// Result of [`PlaylistRepo::restore`].
#[derive(Debug)]
pub enum RestoreOutcome {
    Restored(Playlist),
    NotFound,
    Conflict { existing: Vec<DbId> },
}

/// Provides schedule queries and transactional lifecycle operations.
pub struct PlaylistRepo;

impl PlaylistRepo {
    /// Find a playlist by its internal ID, approved or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Playlist>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM playlists WHERE id = $1");
        sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the approved playlist on air at `at` for `queue`.
    ///
    /// The queue must match exactly: `None` only matches playlists without a
    /// queue. If legacy data has overlapping playlists the earliest-starting
    /// one wins.
    pub async fn find_active(
        pool: &PgPool,
        at: Timestamp,
        queue: Option<&str>,
    ) -> Result<Option<Playlist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM playlists \
             WHERE approved_at IS NOT NULL \
               AND timeslot_start <= $1 \
               AND timeslot_end > $1 \
               AND queue IS NOT DISTINCT FROM $2 \
             ORDER BY timeslot_start, id \
             LIMIT 1"
        );
        sqlx::query_as::<_, Playlist>(&query)
            .bind(at)
            .bind(queue)
            .fetch_optional(pool)
            .await
    }

    /// Find approved playlists in `queue` whose interval overlaps `[start, end)`.
    ///
    /// `exclude` omits one playlist id (used when restoring it).
    pub async fn find_overlapping<'e, E: PgExecutor<'e>>(
        executor: E,
        start: Timestamp,
        end: Timestamp,
        queue: Option<&str>,
        exclude: Option<DbId>,
    ) -> Result<Vec<Playlist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM playlists \
             WHERE approved_at IS NOT NULL \
               AND timeslot_start < $2 \
               AND timeslot_end > $1 \
               AND queue IS NOT DISTINCT FROM $3 \
               AND ($4::BIGINT IS NULL OR id <> $4) \
             ORDER BY timeslot_start, id"
        );
        sqlx::query_as::<_, Playlist>(&query)
            .bind(start)
            .bind(end)
            .bind(queue)
            .bind(exclude)
            .fetch_all(executor)
            .await
    }

    /// List approved playlists that have not ended by `now`, with track counts.
    pub async fn list_upcoming(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<PlaylistSummary>, sqlx::Error> {
        sqlx::query_as::<_, PlaylistSummary>(
            "SELECT p.id, p.timeslot_start, p.timeslot_end, p.queue, p.dj_id, \
                    p.uploader, p.approved_at, \
                    COUNT(t.id) AS track_count, \
                    COUNT(t.id) FILTER (WHERE t.played = false) AS unplayed_count \
             FROM playlists p \
             LEFT JOIN tracks t ON t.playlist_id = p.id \
             WHERE p.approved_at IS NOT NULL AND p.timeslot_end >= $1 \
             GROUP BY p.id \
             ORDER BY p.timeslot_start, p.id",
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Create an approved playlist with its tracks, optionally overwriting
    /// overlapping playlists in the same queue.
    ///
    /// All-or-nothing: on any outcome other than `Created`, or any error,
    /// nothing is written.
    pub async fn replace_slot(
        pool: &PgPool,
        input: &CreatePlaylist,
        urls: &[String],
        overwrite: bool,
    ) -> Result<ReplaceOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_schedule(&mut tx).await?;

        let existing = Self::find_overlapping(
            &mut *tx,
            input.timeslot_start,
            input.timeslot_end,
            input.queue.as_deref(),
            None,
        )
        .await?;
        let existing: Vec<DbId> = existing.iter().map(|p| p.id).collect();

        if !existing.is_empty() {
            if !overwrite {
                tx.rollback().await?;
                return Ok(ReplaceOutcome::Conflict { existing });
            }
            for &playlist_id in &existing {
                if TrackRepo::lock_and_check_played(&mut tx, playlist_id).await? {
                    tx.rollback().await?;
                    return Ok(ReplaceOutcome::Locked { playlist_id });
                }
            }
            sqlx::query("DELETE FROM playlists WHERE id = ANY($1)")
                .bind(&existing)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(replaced = ?existing, "Deleted overlapping playlists");
        }

        let query = format!(
            "INSERT INTO playlists (timeslot_start, timeslot_end, queue, dj_id, uploader, approved_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             RETURNING {COLUMNS}"
        );
        let playlist = sqlx::query_as::<_, Playlist>(&query)
            .bind(input.timeslot_start)
            .bind(input.timeslot_end)
            .bind(&input.queue)
            .bind(input.dj_id)
            .bind(&input.uploader)
            .fetch_one(&mut *tx)
            .await?;

        let tracks = TrackRepo::insert_batch(&mut tx, playlist.id, urls).await?;

        tx.commit().await?;
        Ok(ReplaceOutcome::Created {
            playlist,
            tracks,
            replaced: existing,
        })
    }

    /// Replace the full track list of a playlist that has not started airing.
    pub async fn replace_tracks(
        pool: &PgPool,
        id: DbId,
        urls: &[String],
    ) -> Result<TrackEditOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_schedule(&mut tx).await?;

        if find_for_update(&mut tx, id).await?.is_none() {
            tx.rollback().await?;
            return Ok(TrackEditOutcome::NotFound);
        }
        if TrackRepo::lock_and_check_played(&mut tx, id).await? {
            tx.rollback().await?;
            return Ok(TrackEditOutcome::Locked);
        }

        TrackRepo::delete_by_playlist(&mut tx, id).await?;
        let tracks = TrackRepo::insert_batch(&mut tx, id, urls).await?;

        tx.commit().await?;
        Ok(TrackEditOutcome::Replaced(tracks))
    }

    /// Soft-delete a playlist by clearing its approval.
    ///
    /// Invalidating an already-invalidated playlist succeeds without change.
    pub async fn invalidate(pool: &PgPool, id: DbId) -> Result<InvalidateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_schedule(&mut tx).await?;

        if find_for_update(&mut tx, id).await?.is_none() {
            tx.rollback().await?;
            return Ok(InvalidateOutcome::NotFound);
        }
        if TrackRepo::lock_and_check_played(&mut tx, id).await? {
            tx.rollback().await?;
            return Ok(InvalidateOutcome::Locked);
        }

        let query = format!(
            "UPDATE playlists SET approved_at = NULL WHERE id = $1 RETURNING {COLUMNS}"
        );
        let playlist = sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(InvalidateOutcome::Invalidated(playlist))
    }

    /// Undo [`invalidate`](Self::invalidate), unless another approved
    /// playlist has since taken the slot.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<RestoreOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_schedule(&mut tx).await?;

        let Some(playlist) = find_for_update(&mut tx, id).await? else {
            tx.rollback().await?;
            return Ok(RestoreOutcome::NotFound);
        };
        if playlist.is_approved() {
            tx.rollback().await?;
            return Ok(RestoreOutcome::Restored(playlist));
        }

        let existing = Self::find_overlapping(
            &mut *tx,
            playlist.timeslot_start,
            playlist.timeslot_end,
            playlist.queue.as_deref(),
            Some(id),
        )
        .await?;
        if !existing.is_empty() {
            tx.rollback().await?;
            return Ok(RestoreOutcome::Conflict {
                existing: existing.iter().map(|p| p.id).collect(),
            });
        }

        let query = format!(
            "UPDATE playlists SET approved_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        let playlist = sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(RestoreOutcome::Restored(playlist))
    }
}

/// Serialize schedule mutations against each other. Reads and dispense
/// claims are not blocked.
async fn lock_schedule(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("LOCK TABLE playlists IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn find_for_update(
    conn: &mut PgConnection,
    id: DbId,
) -> Result<Option<Playlist>, sqlx::Error> {
    let query = format!("SELECT {COLUMNS} FROM playlists WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Playlist>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}
