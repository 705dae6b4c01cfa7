//! `/discover.json`, `/lineup.json`, `/lineup_status.json`, `/device.xml`: the documents
//! Plex's HDHomeRun client uses to detect the tuner and build its channel lineup.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::hdhr::{DeviceXml, DiscoverResponse, LineupEntry, LineupStatus};
use crate::web::AppState;

pub async fn discover_json(State(state): State<AppState>) -> Json<DiscoverResponse> {
    Json(DiscoverResponse::from_config(&state.config))
}

pub async fn lineup_json(State(state): State<AppState>) -> Json<Vec<LineupEntry>> {
    let snapshot = state.catalog.snapshot();
    let entries = LineupEntry::build_lineup(&snapshot, &state.config.effective_base_url(), state.config.lineup_nonce);
    Json(entries)
}

pub async fn lineup_status_json(State(state): State<AppState>) -> Json<LineupStatus> {
    Json(LineupStatus::from_config(&state.config))
}

pub async fn device_xml(State(state): State<AppState>) -> Response {
    let body = DeviceXml::from_config(&state.config).as_xml();
    ([("content-type", "text/xml; charset=utf-8")], body).into_response()
}
