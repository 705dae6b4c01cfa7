//! URL iteration: try each candidate upstream URL in order, skipping scheme-rejected,
//! transport-failed, non-200, or empty-body responses until one succeeds.

use reqwest::Response;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::LiveChannel;
use crate::utils::http_client::PooledHttpClient;
use crate::utils::safe_url;

pub struct SelectedUpstream {
    pub url: String,
    pub response: Response,
}

/// Walk `channel`'s candidate URLs in order and return the first one that passes the
/// scheme guard and yields a non-empty 200 response. `AppError::AllUpstreamsFailed` if none
/// do (including the case where there were no candidates at all).
pub async fn select_upstream(
    channel: &LiveChannel,
    client: &PooledHttpClient,
    basic_auth: Option<(&str, &str)>,
) -> AppResult<SelectedUpstream> {
    for url in channel.candidate_urls() {
        if safe_url::guard_scheme(url).is_err() {
            debug!(url, "skipping upstream: scheme not allowed");
            continue;
        }

        let response = match client.get_with_retry(url, basic_auth).await {
            Ok(r) => r,
            Err(e) => {
                debug!(url, error = %e, "skipping upstream: transport error");
                continue;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "skipping upstream: non-200 status");
            continue;
        }

        if response.content_length() == Some(0) {
            debug!(url, "skipping upstream: Content-Length: 0 (dead edge)");
            continue;
        }

        return Ok(SelectedUpstream { url: url.to_string(), response });
    }

    Err(AppError::AllUpstreamsFailed { channel_id: channel.stream_key().to_string() })
}
