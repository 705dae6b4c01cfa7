//! `/guide.xml`: a TTL cache over the remap pipeline, double-checked on miss so concurrent
//! requests during a cold cache collapse into a single upstream fetch.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::normalize::NormalizeConfig;
use super::{dummy, remap};
use crate::config::XmltvConfig;
use crate::errors::AppResult;
use crate::models::LiveChannel;
use crate::utils::http_client::PooledHttpClient;

struct CachedGuide {
    body: String,
    expires_at: Instant,
}

/// Caches the remapped XMLTV document behind an `RwLock`, re-fetching the upstream feed at
/// most once per `ttl` even under concurrent access: the read-lock fast path serves the
/// cached bytes until expiry, and only the first request past expiry pays for the upstream
/// fetch + remap while others wait on the write lock and then observe the now-fresh cache.
pub struct XmltvCache {
    config: XmltvConfig,
    client: PooledHttpClient,
    source_info_name: String,
    current: RwLock<Option<CachedGuide>>,
}

impl XmltvCache {
    pub fn new(config: XmltvConfig, client: PooledHttpClient, source_info_name: String) -> Self {
        Self { config, client, source_info_name, current: RwLock::new(None) }
    }

    /// Serve the cached document if still fresh; otherwise fetch and remap, publishing the
    /// result for subsequent callers. A fetch failure falls back to the stale cached copy if
    /// one exists, or a placeholder guide if not — both are served as 200.
    pub async fn get(&self, channels: &Arc<Vec<LiveChannel>>) -> String {
        if let Some(body) = self.fresh_cached().await {
            return body;
        }

        let mut guard = self.current.write().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return cached.body.clone();
            }
        }

        let body = match self.fetch_and_remap(channels).await {
            Ok(body) => body,
            Err(e) => {
                if let Some(cached) = guard.as_ref() {
                    warn!(error = %e, "XMLTV fetch failed, serving stale cache");
                    return cached.body.clone();
                }
                error!(error = %e, "XMLTV fetch failed with no cache, serving placeholder guide");
                placeholder_or_empty(&self.source_info_name, channels)
            }
        };

        *guard = Some(CachedGuide { body: body.clone(), expires_at: Instant::now() + self.config.ttl });
        body
    }

    async fn fresh_cached(&self) -> Option<String> {
        let guard = self.current.read().await;
        guard.as_ref().filter(|c| c.expires_at > Instant::now()).map(|c| c.body.clone())
    }

    async fn fetch_and_remap(&self, channels: &Arc<Vec<LiveChannel>>) -> AppResult<String> {
        let Some(url) = self.config.url.as_deref() else {
            debug!("no XMLTV URL configured, serving placeholder guide");
            return placeholder_guide(&self.source_info_name, channels);
        };

        let response = tokio::time::timeout(self.config.fetch_timeout, self.client.get_with_retry(url, None))
            .await
            .map_err(|_| crate::errors::AppError::xmltv(format!("fetch of {url} timed out")))??;

        let body = response.text().await.map_err(crate::errors::AppError::Http)?;
        let normalize_cfg = NormalizeConfig {
            preferred_languages: self.config.preferred_languages.clone(),
            latin_preference: self.config.latin_preference,
        };
        let remapped = remap::remap(&body, channels, &self.source_info_name, &normalize_cfg)?;

        if self.config.dummy_guide {
            dummy::inject_dummy_guide(&remapped, channels, Utc::now())
        } else {
            Ok(remapped)
        }
    }
}

fn placeholder_guide(source_info_name: &str, channels: &[LiveChannel]) -> AppResult<String> {
    dummy::placeholder_guide(channels, source_info_name, Utc::now())
}

fn placeholder_or_empty(source_info_name: &str, channels: &[LiveChannel]) -> String {
    placeholder_guide(source_info_name, channels).unwrap_or_else(|e| {
        error!(error = %e, "failed to build placeholder guide, serving empty document");
        format!(r#"<tv source-info-name="{source_info_name}"></tv>"#)
    })
}
