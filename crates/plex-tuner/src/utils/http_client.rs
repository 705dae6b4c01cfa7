//! A pooled HTTP client with a `Retry-After`-aware retry policy, used for the XMLTV fetch
//! and the gateway's upstream probing.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::errors::{AppError, AppResult};

const USER_AGENT: &str = "plex-tuner/1.0";
/// One extra attempt on a throttled/server-error response, never an unbounded retry loop.
const MAX_RETRIES: u32 = 1;

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub retry_after_cap: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: crate::config::defaults::default_connect_timeout(),
            retry_after_cap: crate::config::defaults::default_retry_after_cap(),
        }
    }
}

/// A thin wrapper over a pooled `reqwest::Client` that retries transient failures (429/503
/// with `Retry-After`) up to `MAX_RETRIES` times before giving up.
#[derive(Clone)]
pub struct PooledHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl PooledHttpClient {
    pub fn new(config: HttpClientConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(AppError::Http)?;
        Ok(Self { client, config })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET `url`, retrying once on a 429 or 5xx response, honoring `Retry-After` when present
    /// and capping the wait at `retry_after_cap`.
    pub async fn get_with_retry(&self, url: &str, basic_auth: Option<(&str, &str)>) -> AppResult<Response> {
        let mut attempt = 0;
        loop {
            let mut request = self.client.get(url);
            if let Some((user, pass)) = basic_auth {
                request = request.basic_auth(user, Some(pass));
            }
            let response = request.send().await.map_err(AppError::Http)?;

            let retryable = response.status() == StatusCode::TOO_MANY_REQUESTS || response.status().is_server_error();
            if retryable && attempt < MAX_RETRIES {
                let wait = retry_after_duration(&response).unwrap_or(Duration::from_secs(1)).min(self.config.retry_after_cap);
                debug!(url, attempt, ?wait, "retrying after throttled response");
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            return Ok(response);
        }
    }
}

fn retry_after_duration(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retries_honoring_retry_after_then_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("GET", "/feed.xml")
            .with_status(503)
            .with_header("retry-after", "0")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/feed.xml")
            .with_status(200)
            .with_body("<tv></tv>")
            .expect(1)
            .create_async()
            .await;

        let client = PooledHttpClient::new(HttpClientConfig::default()).unwrap();
        let url = format!("{}/feed.xml", server.url());
        let response = client.get_with_retry(&url, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        throttled.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn retries_once_on_5xx_then_gives_up_permanently_failing() {
        let mut server = mockito::Server::new_async().await;
        let failing = server.mock("GET", "/feed.xml").with_status(502).expect(2).create_async().await;

        let client = PooledHttpClient::new(HttpClientConfig::default()).unwrap();
        let url = format!("{}/feed.xml", server.url());
        let response = client.get_with_retry(&url, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        failing.assert_async().await;
    }

    #[tokio::test]
    async fn passes_basic_auth_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/feed.xml")
            .match_header("authorization", mockito::Matcher::Any)
            .with_status(200)
            .create_async()
            .await;

        let client = PooledHttpClient::new(HttpClientConfig::default()).unwrap();
        let url = format!("{}/feed.xml", server.url());
        let response = client.get_with_retry(&url, Some(("user", "pass"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_async().await;
    }
}
