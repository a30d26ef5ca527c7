//! Repository for the `tracks` table.

use pload_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::track::Track;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, playlist_id, position, url, played, played_at, created_at";

/// Provides ordered track storage and the atomic dispense claim.
pub struct TrackRepo;

impl TrackRepo {
    /// List every track of a playlist in dispense order.
    pub async fn list_by_playlist(
        pool: &PgPool,
        playlist_id: DbId,
    ) -> Result<Vec<Track>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tracks WHERE playlist_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(playlist_id)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim the lowest-positioned unplayed track of an approved
    /// playlist, marking it played in the same transaction.
    ///
    /// Claims on one playlist are serialized by a transaction-scoped advisory
    /// lock keyed on the playlist id, so concurrent pollers receive tracks
    /// strictly in position order and never the same track twice. Lifecycle
    /// mutations take the same lock. Returns `None` once the playlist is
    /// exhausted (or no longer approved); repeated calls keep returning `None`.
    pub async fn claim_next(
        pool: &PgPool,
        playlist_id: DbId,
    ) -> Result<Option<Track>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_playlist(&mut tx, playlist_id).await?;

        let query = format!(
            "UPDATE tracks \
             SET played = true, played_at = clock_timestamp() \
             WHERE id = ( \
                 SELECT t.id FROM tracks t \
                 JOIN playlists p ON p.id = t.playlist_id \
                 WHERE t.playlist_id = $1 \
                   AND t.played = false \
                   AND p.approved_at IS NOT NULL \
                 ORDER BY t.position, t.id \
                 LIMIT 1 \
             ) \
             RETURNING {COLUMNS}"
        );
        let track = sqlx::query_as::<_, Track>(&query)
            .bind(playlist_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(track)
    }

    /// Insert `urls` as the tracks of `playlist_id`, positions 1..=n in order.
    pub(crate) async fn insert_batch(
        conn: &mut PgConnection,
        playlist_id: DbId,
        urls: &[String],
    ) -> Result<Vec<Track>, sqlx::Error> {
        let query = format!(
            "INSERT INTO tracks (playlist_id, position, url) \
             SELECT $1, t.ord::INTEGER, t.url \
             FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(url, ord) \
             ORDER BY t.ord \
             RETURNING {COLUMNS}"
        );
        let mut tracks = sqlx::query_as::<_, Track>(&query)
            .bind(playlist_id)
            .bind(urls)
            .fetch_all(&mut *conn)
            .await?;
        tracks.sort_by_key(|t| t.position);
        Ok(tracks)
    }

    /// Take the playlist's claim lock and report whether any track has aired.
    ///
    /// Waits for an in-flight claim to commit, so a track being dispensed
    /// right now is seen as played. The lock is held until the caller's
    /// transaction ends.
    pub(crate) async fn lock_and_check_played(
        conn: &mut PgConnection,
        playlist_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        lock_playlist(&mut *conn, playlist_id).await?;
        let (played,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM tracks WHERE playlist_id = $1 AND played)",
        )
        .bind(playlist_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(played)
    }

    /// Delete every track of a playlist. Returns the number of rows removed.
    pub(crate) async fn delete_by_playlist(
        conn: &mut PgConnection,
        playlist_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE playlist_id = $1")
            .bind(playlist_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Transaction-scoped advisory lock serializing claims and lifecycle
/// mutations on one playlist.
async fn lock_playlist(conn: &mut PgConnection, playlist_id: DbId) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(playlist_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
