//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the production router via [`build_app_router`] and drives it with
//! `tower::ServiceExt::oneshot`, so tests exercise the same middleware stack
//! (CORS, request ID, timeout, tracing, panic recovery) that production uses.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use pload_api::config::{AutomationCredentials, ServerConfig, StationConfig};
use pload_api::router::build_app_router;
use pload_api::state::AppState;
use pload_db::models::playlist::{CreatePlaylist, Playlist};
use pload_db::repositories::{PlaylistRepo, ReplaceOutcome};
use sqlx::PgPool;
use tower::ServiceExt;

pub const AUTOMATION_USER: &str = "automation";
pub const AUTOMATION_PASSWORD: &str = "s3cret";

/// Build a test `ServerConfig` with safe defaults.
///
/// Reachability probes and external collaborators are disabled; automation
/// credentials are set to [`AUTOMATION_USER`] / [`AUTOMATION_PASSWORD`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        station: StationConfig {
            automation: Some(AutomationCredentials {
                username: AUTOMATION_USER.to_string(),
                password: AUTOMATION_PASSWORD.to_string(),
            }),
            ..StationConfig::default()
        },
    }
}

/// Build the full application router using [`test_config`].
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Build the full application router with a custom configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone()).expect("Failed to build app state");
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

pub fn automation_auth() -> String {
    basic_auth(AUTOMATION_USER, AUTOMATION_PASSWORD)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_auth(app: Router, uri: &str, authorization: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header(AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, &body, None)).await
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    user: &str,
) -> Response<Body> {
    send(app, json_request("POST", uri, &body, Some(user))).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("PUT", uri, &body, None)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::post(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

fn json_request(
    method: &str,
    uri: &str,
    body: &serde_json::Value,
    forwarded_user: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(user) = forwarded_user {
        builder = builder.header("x-forwarded-user", user);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Schedule an approved playlist covering the current instant.
pub async fn on_air_playlist(
    pool: &PgPool,
    queue: Option<&str>,
    dj_id: Option<i64>,
    urls: &[&str],
) -> Playlist {
    let now = Utc::now();
    let input = CreatePlaylist {
        timeslot_start: now - Duration::hours(1),
        timeslot_end: now + Duration::hours(1),
        queue: queue.map(str::to_string),
        dj_id,
        uploader: None,
    };
    let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
    match PlaylistRepo::replace_slot(pool, &input, &urls, false)
        .await
        .unwrap()
    {
        ReplaceOutcome::Created { playlist, .. } => playlist,
        other => panic!("expected Created, got {other:?}"),
    }
}
