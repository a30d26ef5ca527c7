//! Handlers for the `/playlists` resource and the time-slot table.
//!
//! Uploads carry the playlist file body inline. Rejected uploads (any line
//! failing validation) answer 422 with the per-line report rather than an
//! error envelope, so the uploader can fix individual lines.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use pload_core::timeslot::{explicit_interval, TimeSlot};
use pload_core::types::{DbId, Timestamp};
use pload_core::url_normalizer::apply_rewrites;
use pload_db::models::playlist::Playlist;
use pload_db::repositories::{PlaylistRepo, TrackRepo};
use serde::{Deserialize, Serialize};

use crate::clients::roster::dj_display_name;
use crate::error::{AppError, AppResult};
use crate::middleware::uploader::Uploader;
use crate::response::DataResponse;
use crate::scheduling::{SlotRequest, UploadReport};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /playlists`.
///
/// The slot is either a named `slot` or explicit `time_start`/`time_end`
/// (local times on `date`; an end at or before the start runs past midnight).
#[derive(Debug, Deserialize)]
pub struct UploadPlaylistRequest {
    pub date: NaiveDate,
    pub slot: Option<String>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub queue: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
    pub dj_id: Option<DbId>,
    /// The playlist file: one URL per line, `#` lines are comments.
    pub playlist: String,
    #[serde(default)]
    pub skip_validate: bool,
}

/// Body of `PUT /playlists/{id}/tracks`.
#[derive(Debug, Deserialize)]
pub struct ReplaceTracksRequest {
    pub playlist: String,
    #[serde(default)]
    pub skip_validate: bool,
}

#[derive(Debug, Serialize)]
pub struct TimeSlotsResponse {
    pub timezone: String,
    pub slots: Vec<TimeSlot>,
}

/// One playlist in the upcoming overview.
#[derive(Debug, Serialize)]
pub struct UpcomingPlaylist {
    pub id: DbId,
    pub queue: Option<String>,
    pub dj_id: Option<DbId>,
    pub dj_name: String,
    pub uploader: Option<String>,
    pub timeslot_start: Timestamp,
    pub timeslot_end: Timestamp,
    pub local_start: DateTime<Tz>,
    pub local_end: DateTime<Tz>,
    pub track_count: i64,
    pub unplayed_count: i64,
}

/// Upcoming playlists sharing a local start date.
#[derive(Debug, Serialize)]
pub struct UpcomingDay {
    pub date: NaiveDate,
    pub playlists: Vec<UpcomingPlaylist>,
}

#[derive(Debug, Serialize)]
pub struct TrackView {
    pub id: DbId,
    pub position: i32,
    /// Stored URL with display rewrites applied.
    pub url: String,
    pub played: bool,
    pub played_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub dj_name: String,
    pub tracks: Vec<TrackView>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/time_slots
pub async fn list_time_slots(
    State(state): State<AppState>,
) -> Json<DataResponse<TimeSlotsResponse>> {
    let station = &state.config.station;
    Json(DataResponse {
        data: TimeSlotsResponse {
            timezone: station.timezone.name().to_string(),
            slots: station.time_slots.slots().to_vec(),
        },
    })
}

/// POST /api/v1/playlists
///
/// Upload a playlist into a slot. Returns 201 with the report, 422 with the
/// report if any line failed, 409 if the slot is taken and `overwrite` is
/// off, 423 if an overlapped playlist has already started airing.
pub async fn upload(
    State(state): State<AppState>,
    Uploader(uploader): Uploader,
    Json(input): Json<UploadPlaylistRequest>,
) -> AppResult<Response> {
    let station = &state.config.station;
    let (timeslot_start, timeslot_end) = match (&input.slot, input.time_start, input.time_end) {
        (Some(slot), None, None) => {
            station
                .time_slots
                .interval(input.date, slot, station.timezone)?
        }
        (None, Some(start), Some(end)) => {
            explicit_interval(input.date, start, end, station.timezone)?
        }
        _ => {
            return Err(AppError::BadRequest(
                "provide either slot or both time_start and time_end".into(),
            ))
        }
    };

    let request = SlotRequest {
        timeslot_start,
        timeslot_end,
        queue: input
            .queue
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
        dj_id: input.dj_id,
        uploader,
        overwrite: input.overwrite,
        skip_validate: input.skip_validate,
    };

    let report = state
        .scheduler
        .create_or_replace(&request, &input.playlist)
        .await?;
    Ok(report_response(StatusCode::CREATED, report))
}

/// GET /api/v1/playlists/upcoming
///
/// Approved playlists that have not ended yet, grouped by local start date.
pub async fn list_upcoming(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UpcomingDay>>>> {
    let tz = state.config.station.timezone;
    let summaries = PlaylistRepo::list_upcoming(&state.pool, Utc::now()).await?;
    let djs = if summaries.is_empty() {
        Vec::new()
    } else {
        state.roster.list().await
    };

    let mut days: Vec<UpcomingDay> = Vec::new();
    for s in summaries {
        let local_start = s.timeslot_start.with_timezone(&tz);
        let entry = UpcomingPlaylist {
            id: s.id,
            dj_name: dj_display_name(&djs, s.dj_id),
            queue: s.queue,
            dj_id: s.dj_id,
            uploader: s.uploader,
            timeslot_start: s.timeslot_start,
            timeslot_end: s.timeslot_end,
            local_start,
            local_end: s.timeslot_end.with_timezone(&tz),
            track_count: s.track_count,
            unplayed_count: s.unplayed_count,
        };

        let date = local_start.date_naive();
        match days.last_mut() {
            Some(day) if day.date == date => day.playlists.push(entry),
            _ => days.push(UpcomingDay {
                date,
                playlists: vec![entry],
            }),
        }
    }

    Ok(Json(DataResponse { data: days }))
}

/// GET /api/v1/playlists/{id}
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PlaylistDetail>>> {
    let playlist = state.scheduler.find(id).await?;
    let tracks = TrackRepo::list_by_playlist(&state.pool, id).await?;
    let djs = state.roster.list().await;
    let rewrites = &state.config.station.display_rewrites;

    let tracks = tracks
        .into_iter()
        .map(|t| TrackView {
            id: t.id,
            position: t.position,
            url: apply_rewrites(rewrites, &t.url),
            played: t.played,
            played_at: t.played_at,
        })
        .collect();

    Ok(Json(DataResponse {
        data: PlaylistDetail {
            dj_name: dj_display_name(&djs, playlist.dj_id),
            playlist,
            tracks,
        },
    }))
}

/// PUT /api/v1/playlists/{id}/tracks
///
/// Replace the whole track list. 423 once any track has aired.
pub async fn replace_tracks(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceTracksRequest>,
) -> AppResult<Response> {
    let report = state
        .scheduler
        .edit(id, &input.playlist, input.skip_validate)
        .await?;
    Ok(report_response(StatusCode::OK, report))
}

/// DELETE /api/v1/playlists/{id}
///
/// Invalidate (soft-delete) a playlist. 423 once any track has aired.
pub async fn invalidate(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.scheduler.invalidate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/playlists/{id}/restore
///
/// Undo an invalidation. 409 if another playlist now holds the slot.
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Playlist>>> {
    let playlist = state.scheduler.restore(id).await?;
    Ok(Json(DataResponse { data: playlist }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn report_response(success: StatusCode, report: UploadReport) -> Response {
    let status = if report.ok {
        success
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(DataResponse { data: report })).into_response()
}
