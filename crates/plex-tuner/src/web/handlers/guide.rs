//! `/guide.xml`: serves the cached, remapped XMLTV document for the current lineup.

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::web::AppState;

pub async fn guide_xml(State(state): State<AppState>) -> Response {
    let channels = state.catalog.snapshot();
    let body = state.xmltv_cache.get(&channels).await;
    ([("content-type", "text/xml; charset=utf-8")], body).into_response()
}
