//! Handler for the automation client's dispense endpoint.

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use pload_core::types::PRERECORDED_QUEUE;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AutomationClient;
use crate::state::AppState;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Deserialize)]
pub struct NextTrackQuery {
    /// `1` selects the prerecorded queue; anything else the default queue.
    pub prerecorded: Option<String>,
}

/// GET /api/v1/next_track
///
/// Claim the next track due now. Responds with the URL and a newline as
/// plain text, or 404 with an empty body when nothing is due.
pub async fn next_track(
    _client: AutomationClient,
    State(state): State<AppState>,
    Query(params): Query<NextTrackQuery>,
) -> AppResult<Response> {
    let queue = (params.prerecorded.as_deref() == Some("1")).then_some(PRERECORDED_QUEUE);

    let response = match state.scheduler.dispense(Utc::now(), queue).await? {
        Some(url) => ([(CONTENT_TYPE, TEXT_PLAIN)], format!("{url}\n")).into_response(),
        None => (StatusCode::NOT_FOUND, [(CONTENT_TYPE, TEXT_PLAIN)], "").into_response(),
    };
    Ok(response)
}
