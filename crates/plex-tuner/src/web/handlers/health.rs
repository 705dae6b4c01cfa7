//! `/healthz`: liveness/readiness probe. Returns 503 until the catalog has been loaded at
//! least once; 200 with a small status document afterwards.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::web::AppState;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    channels: usize,
    tuners_in_use: u32,
    tuner_count: u32,
    uptime_secs: u64,
}

pub async fn healthz(State(state): State<AppState>) -> Response {
    if !state.is_ready() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(HealthBody {
            status: "starting",
            channels: 0,
            tuners_in_use: 0,
            tuner_count: state.tuner_counter.limit(),
            uptime_secs: state.started_at.elapsed().as_secs(),
        }))
            .into_response();
    }

    let body = HealthBody {
        status: "ok",
        channels: state.catalog.snapshot().len(),
        tuners_in_use: state.tuner_counter.in_use().await,
        tuner_count: state.tuner_counter.limit(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
