//! Handlers for URL validation, metadata search and the DJ roster.

use axum::extract::{Query, State};
use axum::Json;
use pload_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::clients::{ClientError, Dj};
use crate::error::{AppError, AppResult};
use crate::handlers::is_truthy;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateTrackQuery {
    pub url: String,
    pub skip_validate: Option<String>,
}

/// Result of validating one URL.
#[derive(Debug, Serialize)]
pub struct ValidateTrackResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Index metadata for the track, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/v1/validate_track
///
/// Run one URL through the normalizer without storing it. Metadata lookup
/// failures are logged and never change `result`.
pub async fn validate_track(
    State(state): State<AppState>,
    Query(params): Query<ValidateTrackQuery>,
) -> AppResult<Json<DataResponse<ValidateTrackResponse>>> {
    let skip_validate = is_truthy(params.skip_validate.as_deref());

    let response = match state.scheduler.validate(&params.url, skip_validate).await {
        Ok(url) => {
            let metadata = match state.search.lookup_url(&url).await {
                Ok(found) => found,
                Err(ClientError::NotConfigured(_)) => None,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Track metadata lookup failed");
                    None
                }
            };
            ValidateTrackResponse {
                result: true,
                url: Some(url),
                error: None,
                metadata,
            }
        }
        Err(CoreError::InvalidUrl(msg)) => ValidateTrackResponse {
            result: false,
            url: None,
            error: Some(msg),
            metadata: None,
        },
        Err(other) => return Err(AppError::Core(other)),
    };

    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/search
///
/// Free-text search of the track index; returns the index's hit list.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::BadRequest("q must not be empty".into()));
    }
    let hits = state.search.search(&params.q).await?;
    Ok(Json(DataResponse { data: hits }))
}

/// GET /api/v1/djs
///
/// The DJ roster. Automation (id 1) is always present, even when the roster
/// service is down.
pub async fn list_djs(State(state): State<AppState>) -> Json<DataResponse<Vec<Dj>>> {
    Json(DataResponse {
        data: state.roster.list().await,
    })
}
