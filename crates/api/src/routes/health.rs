//! Liveness endpoint for the reverse proxy and the automation host.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Whether `/api/v1/next_track` can authenticate anyone.
    pub dispense_enabled: bool,
    /// Timezone that named slots and upload dates are interpreted in.
    pub station_timezone: &'static str,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = pload_db::health_check(&state.pool).await.is_ok();
    let station = &state.config.station;

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        dispense_enabled: station.automation.is_some(),
        station_timezone: station.timezone.name(),
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
