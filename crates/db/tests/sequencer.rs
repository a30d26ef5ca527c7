//! Integration tests for the dispense claim.
//!
//! Verifies that tracks come out in position order, each exactly once, even
//! under concurrent pollers, and that exhausted or invalidated playlists stop
//! yielding tracks.

use std::collections::HashSet;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use pload_db::models::playlist::{CreatePlaylist, Playlist};
use assert_matches::assert_matches;
use pload_db::repositories::{
    InvalidateOutcome, PlaylistRepo, ReplaceOutcome, TrackEditOutcome, TrackRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn on_air_playlist(pool: &PgPool, urls: &[&str]) -> Playlist {
    let now = Utc::now();
    let input = CreatePlaylist {
        timeslot_start: now - Duration::hours(1),
        timeslot_end: now + Duration::hours(1),
        queue: None,
        dj_id: None,
        uploader: None,
    };
    let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
    match PlaylistRepo::replace_slot(pool, &input, &urls, false).await.unwrap() {
        ReplaceOutcome::Created { playlist, .. } => playlist,
        other => panic!("expected Created, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Ordering and exhaustion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn claims_follow_position_order(pool: PgPool) {
    let playlist = on_air_playlist(&pool, &["http://a/1", "http://a/2", "http://a/3"]).await;

    let mut urls = Vec::new();
    while let Some(track) = TrackRepo::claim_next(&pool, playlist.id).await.unwrap() {
        assert!(track.played);
        assert!(track.played_at.is_some());
        urls.push(track.url);
    }
    assert_eq!(urls, ["http://a/1", "http://a/2", "http://a/3"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exhausted_playlist_keeps_returning_none(pool: PgPool) {
    let playlist = on_air_playlist(&pool, &["http://a/only"]).await;

    assert!(TrackRepo::claim_next(&pool, playlist.id).await.unwrap().is_some());
    for _ in 0..3 {
        assert!(TrackRepo::claim_next(&pool, playlist.id).await.unwrap().is_none());
    }

    let tracks = TrackRepo::list_by_playlist(&pool, playlist.id).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert!(tracks[0].played);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_urls_are_separate_tracks(pool: PgPool) {
    let playlist = on_air_playlist(&pool, &["http://a/same", "http://a/same"]).await;

    let first = TrackRepo::claim_next(&pool, playlist.id).await.unwrap().unwrap();
    let second = TrackRepo::claim_next(&pool, playlist.id).await.unwrap().unwrap();
    assert_eq!(first.url, second.url);
    assert_ne!(first.id, second.id);
    assert_eq!((first.position, second.position), (1, 2));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_claims_dispense_each_track_once(pool: PgPool) {
    let urls: Vec<String> = (1..=20).map(|i| format!("http://a/{i}")).collect();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let playlist = on_air_playlist(&pool, &refs).await;

    let claims = (0..40).map(|_| {
        let pool = pool.clone();
        async move { TrackRepo::claim_next(&pool, playlist.id).await.unwrap() }
    });
    let results = futures::future::join_all(claims).await;

    let claimed: Vec<_> = results.into_iter().flatten().collect();
    let ids: HashSet<_> = claimed.iter().map(|t| t.id).collect();
    assert_eq!(claimed.len(), 20);
    assert_eq!(ids.len(), 20);

    let remaining = TrackRepo::list_by_playlist(&pool, playlist.id).await.unwrap();
    assert!(remaining.iter().all(|t| t.played));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_claims_follow_position_order(pool: PgPool) {
    let urls: Vec<String> = (1..=20).map(|i| format!("http://a/{i}")).collect();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let playlist = on_air_playlist(&pool, &refs).await;

    let claims = (0..30).map(|_| {
        let pool = pool.clone();
        async move { TrackRepo::claim_next(&pool, playlist.id).await.unwrap() }
    });
    let mut claimed: Vec<_> = futures::future::join_all(claims)
        .await
        .into_iter()
        .flatten()
        .collect();

    // Claims are serialized, so dispense time order is claim order.
    claimed.sort_by_key(|t| t.played_at);
    let positions: Vec<i32> = claimed.iter().map(|t| t.position).collect();
    assert_eq!(positions, (1..=20).collect::<Vec<i32>>());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_waits_for_locked_track_instead_of_skipping_it(pool: PgPool) {
    let playlist = on_air_playlist(&pool, &["http://a/1", "http://a/2"]).await;

    // Another session holds row locks on every track.
    let mut holder = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM tracks WHERE playlist_id = $1 FOR UPDATE")
        .bind(playlist.id)
        .fetch_all(&mut *holder)
        .await
        .unwrap();

    let claim = tokio::spawn({
        let pool = pool.clone();
        async move { TrackRepo::claim_next(&pool, playlist.id).await.unwrap() }
    });
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    assert!(!claim.is_finished());

    holder.rollback().await.unwrap();
    let track = claim.await.unwrap().expect("a track is still due");
    assert_eq!(track.url, "http://a/1");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_proceeds_while_invalidate_is_blocked(pool: PgPool) {
    let playlist = on_air_playlist(&pool, &["http://a/1", "http://a/2", "http://a/3"]).await;
    TrackRepo::claim_next(&pool, playlist.id).await.unwrap().unwrap();

    // A concurrent schedule change holds the schedule lock.
    let mut holder = pool.begin().await.unwrap();
    sqlx::query("LOCK TABLE playlists IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *holder)
        .await
        .unwrap();

    let invalidate = tokio::spawn({
        let pool = pool.clone();
        async move { PlaylistRepo::invalidate(&pool, playlist.id).await.unwrap() }
    });
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    let track = TrackRepo::claim_next(&pool, playlist.id).await.unwrap();
    assert_eq!(track.map(|t| t.position), Some(2));
    assert!(!invalidate.is_finished());

    holder.rollback().await.unwrap();
    assert_matches!(invalidate.await.unwrap(), InvalidateOutcome::Locked);
    let track = TrackRepo::claim_next(&pool, playlist.id).await.unwrap();
    assert_eq!(track.map(|t| t.position), Some(3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claims_racing_an_edit_never_come_back_empty(pool: PgPool) {
    let urls: Vec<String> = (1..=10).map(|i| format!("http://a/{i}")).collect();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let playlist = on_air_playlist(&pool, &refs).await;
    TrackRepo::claim_next(&pool, playlist.id).await.unwrap().unwrap();

    let edits = (0..5).map(|_| {
        let pool = pool.clone();
        tokio::spawn(async move {
            PlaylistRepo::replace_tracks(&pool, playlist.id, &["http://b/1".to_string()])
                .await
                .unwrap()
        })
    });
    let claims = (0..9).map(|_| {
        let pool = pool.clone();
        tokio::spawn(async move { TrackRepo::claim_next(&pool, playlist.id).await.unwrap() })
    });
    let edits: Vec<_> = edits.collect();
    let claims: Vec<_> = claims.collect();

    for claim in claims {
        assert!(claim.await.unwrap().is_some());
    }
    for edit in edits {
        assert_matches!(edit.await.unwrap(), TrackEditOutcome::Locked);
    }
}

// ---------------------------------------------------------------------------
// Approval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalidated_playlist_cannot_be_claimed(pool: PgPool) {
    let playlist = on_air_playlist(&pool, &["http://a/1"]).await;

    let outcome = PlaylistRepo::invalidate(&pool, playlist.id).await.unwrap();
    assert!(matches!(outcome, InvalidateOutcome::Invalidated(_)));

    assert!(TrackRepo::claim_next(&pool, playlist.id).await.unwrap().is_none());
    let tracks = TrackRepo::list_by_playlist(&pool, playlist.id).await.unwrap();
    assert!(!tracks[0].played);
}
