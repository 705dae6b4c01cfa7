//! `/live.m3u`: the extended M3U playlist alternative to HDHR discovery.

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::m3u;
use crate::web::AppState;

pub async fn live_m3u(State(state): State<AppState>) -> Response {
    let snapshot = state.catalog.snapshot();
    let body = m3u::build_playlist(&snapshot, &state.config.effective_base_url(), state.config.lineup.epg_prune);
    ([("content-type", "audio/x-mpegurl")], body).into_response()
}
