//! Maps `AppError` onto the HTTP status/body the spec's error handling design calls for.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::AppError;

/// The HDHR "All Tuners In Use" error code, surfaced as a header so Plex's own tuner-busy
/// handling kicks in instead of a generic failure.
const HDHOMERUN_ERROR_HEADER: &str = "X-HDHomeRun-Error";
const ALL_TUNERS_IN_USE: &str = "805";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::TunersInUse { limit } => {
                warn!(limit, "admission refused: all tuners in use");
                let mut response =
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": self.to_string()}))).into_response();
                response
                    .headers_mut()
                    .insert(HDHOMERUN_ERROR_HEADER, HeaderValue::from_static(ALL_TUNERS_IN_USE));
                response
            }
            AppError::ChannelNotFound { key } => {
                debug!(key, "stream request for unknown channel");
                (StatusCode::NOT_FOUND, Json(json!({"error": self.to_string()}))).into_response()
            }
            AppError::AllUpstreamsFailed { channel_id } => {
                warn!(channel_id, "all upstream URLs failed");
                (StatusCode::BAD_GATEWAY, Json(json!({"error": self.to_string()}))).into_response()
            }
            AppError::SchemeRejected { .. } => {
                (StatusCode::BAD_GATEWAY, Json(json!({"error": self.to_string()}))).into_response()
            }
            AppError::Configuration { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": self.to_string()}))).into_response()
            }
            AppError::Catalog { .. } | AppError::Xmltv { .. } | AppError::Supervisor { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": self.to_string()}))).into_response()
            }
            AppError::Ffmpeg { .. } => {
                warn!(error = %self, "ffmpeg pipeline failure");
                (StatusCode::BAD_GATEWAY, Json(json!({"error": self.to_string()}))).into_response()
            }
            AppError::Io(_) | AppError::Http(_) | AppError::Json(_) | AppError::Internal { .. } => {
                warn!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": self.to_string()}))).into_response()
            }
        }
    }
}
