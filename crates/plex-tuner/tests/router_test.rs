//! Black-box router tests: drive the assembled axum `Router` with `tower::ServiceExt::oneshot`
//! against an in-memory catalog, the way the project's own `tests/api_routes_test.rs` drives
//! its router with a plain `Request`/`oneshot` helper.

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use plex_tuner::catalog::CatalogStore;
use plex_tuner::config::keywords::LineupKeywords;
use plex_tuner::config::Config;
use plex_tuner::models::LiveChannel;
use plex_tuner::web::{build_router, AppState};

async fn send_request(app: &Router, method: Method, uri: &str) -> (StatusCode, Value, axum::http::HeaderMap) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json, headers)
}

fn channel(channel_id: &str, guide_number: &str, stream_url: &str) -> LiveChannel {
    LiveChannel {
        channel_id: channel_id.to_string(),
        guide_number: guide_number.to_string(),
        guide_name: "Test Channel".to_string(),
        tvg_id: String::new(),
        epg_linked: false,
        group_title: String::new(),
        stream_url: stream_url.to_string(),
        stream_urls: Vec::new(),
    }
}

async fn build_state(tuner_count: u32, channels: Vec<LiveChannel>) -> AppState {
    let mut config = Config::default();
    config.tuner_count = tuner_count;
    // Points ffmpeg spawn at a binary that cannot exist, forcing the deterministic
    // direct-passthrough fallback instead of depending on whether the test host has
    // ffmpeg installed.
    config.stream.ffmpeg_path = "plex-tuner-test-no-such-ffmpeg-binary".to_string();

    let lineup = config.lineup.clone();
    let keywords = LineupKeywords::default();
    let catalog_dir = tempfile::tempdir().unwrap();
    let catalog_path = catalog_dir.path().join("catalog.json");
    let catalog = CatalogStore::load(&catalog_path, &lineup, &keywords).await.unwrap();
    catalog.replace(channels, &lineup, &keywords).await.unwrap();
    // The shaped snapshot lives in the `ArcSwap`, not on disk; the tempdir can go away once
    // `replace` returns since these tests never trigger a background reload from `path`.
    drop(catalog_dir);

    AppState::new(config, keywords, catalog).unwrap()
}

#[tokio::test]
async fn healthz_is_503_until_ready_then_200_once_the_catalog_is_marked_loaded() {
    let state = build_state(2, Vec::new()).await;
    state.ready.store(false, Ordering::Relaxed);
    let app = build_router(state.clone());

    let (status, body, _) = send_request(&app, Method::GET, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "starting");

    state.ready.store(true, Ordering::Relaxed);
    let (status, body, _) = send_request(&app, Method::GET, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn discover_json_matches_hdhr_field_names_and_defaults() {
    let state = build_state(2, Vec::new()).await;
    let app = build_router(state);

    let (status, body, _) = send_request(&app, Method::GET, "/discover.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["BaseURL"], "http://localhost:5004");
    assert_eq!(body["DeviceID"], "plextuner01");
    assert_eq!(body["TunerCount"], 2);
    assert_eq!(body["LineupURL"], "http://localhost:5004/lineup.json");
}

#[tokio::test]
async fn lineup_status_json_reports_scan_possible_by_default() {
    let state = build_state(2, Vec::new()).await;
    let app = build_router(state);

    let (status, body, _) = send_request(&app, Method::GET, "/lineup_status.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ScanInProgress"], 0);
    assert_eq!(body["ScanPossible"], 1);
}

#[tokio::test]
async fn lineup_json_exposes_the_stream_url_fallback_chain() {
    let channels = vec![
        channel("ch1", "1", "https://upstream.example/one.ts"),
        channel("", "2", "https://upstream.example/two.ts"),
    ];
    let state = build_state(2, channels).await;
    let app = build_router(state);

    let (status, body, _) = send_request(&app, Method::GET, "/lineup.json").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["URL"], "http://localhost:5004/stream/ch1");
    // Empty ChannelID falls back to its position in the snapshot.
    assert_eq!(entries[1]["URL"], "http://localhost:5004/stream/1");
}

#[tokio::test]
async fn unknown_stream_key_is_404() {
    let state = build_state(2, Vec::new()).await;
    let app = build_router(state);

    let (status, _, _) = send_request(&app, Method::GET, "/stream/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admission_limit_of_one_admits_one_request_and_rejects_the_next_with_805() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/live.ts")
        .with_status(200)
        .with_header("content-type", "video/mp2t")
        .with_body("bytes-on-the-wire")
        .create_async()
        .await;

    let stream_url = format!("{}/live.ts", server.url());
    let channels = vec![channel("ch1", "1", &stream_url)];
    let state = build_state(1, channels).await;
    let app = build_router(state);

    // Held open deliberately: the admitted response's body owns the `TunerGuard`, so the
    // slot stays occupied for as long as `first` is alive, without needing the first
    // request's body to actually be read.
    let first = app
        .clone()
        .oneshot(Request::builder().method(Method::GET).uri("/stream/ch1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let (second_status, _, second_headers) = send_request(&app, Method::GET, "/stream/ch1").await;
    assert_eq!(second_status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(second_headers.get("X-HDHomeRun-Error").unwrap(), "805");

    drop(first);
}
