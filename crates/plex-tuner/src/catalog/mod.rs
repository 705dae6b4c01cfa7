//! The channel catalog: the source-of-truth channel table, loaded from disk at startup and
//! swappable at runtime without interrupting in-flight streams.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};

use crate::config::keywords::LineupKeywords;
use crate::config::LineupConfig;
use crate::errors::{AppError, AppResult};
use crate::lineup::shaper;
use crate::models::{Catalog, LiveChannel};

/// Holds the current, shaped channel lineup behind an `ArcSwap` so HTTP handlers read a
/// consistent snapshot without locking, while a reload can publish a new one atomically.
pub struct CatalogStore {
    path: PathBuf,
    current: ArcSwap<Vec<LiveChannel>>,
}

impl CatalogStore {
    /// Load the raw catalog from `path`, apply the lineup shaping pipeline, and hold the
    /// result. A missing file yields an empty catalog rather than an error: a tuner with
    /// no channels configured yet is a valid, if useless, starting state.
    pub async fn load(path: impl Into<PathBuf>, lineup: &LineupConfig, keywords: &LineupKeywords) -> AppResult<Self> {
        let path = path.into();
        let raw = Self::read_raw(&path).await?;
        let shaped = shaper::shape(raw, lineup, keywords);
        info!(channels = shaped.len(), path = %path.display(), "catalog loaded");
        Ok(Self {
            path,
            current: ArcSwap::from_pointee(shaped),
        })
    }

    async fn read_raw(path: &Path) -> AppResult<Catalog> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::catalog(format!("invalid catalog at {}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "no catalog file found, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// The current shaped lineup snapshot. Cheap: an `Arc` clone, not a copy.
    pub fn snapshot(&self) -> Arc<Vec<LiveChannel>> {
        self.current.load_full()
    }

    /// Resolve a `/stream/<key>` path suffix to a channel: exact `ChannelID` match, then
    /// exact `GuideNumber` match, then (for backwards-compatible numeric URLs) `key` as a
    /// zero-based index into the current snapshot.
    pub fn find(&self, key: &str) -> Option<LiveChannel> {
        let snapshot = self.current.load();

        if let Some(channel) = snapshot.iter().find(|c| c.channel_id == key) {
            return Some(channel.clone());
        }
        if let Some(channel) = snapshot.iter().find(|c| c.guide_number == key) {
            return Some(channel.clone());
        }
        key.parse::<usize>().ok().and_then(|index| snapshot.get(index)).cloned()
    }

    /// Re-read the catalog file from disk, re-run the shaping pipeline, and publish the
    /// result. Existing snapshots held by in-flight requests remain valid; only new lookups
    /// see the update.
    pub async fn reload(&self, lineup: &LineupConfig, keywords: &LineupKeywords) -> AppResult<usize> {
        let raw = Self::read_raw(&self.path).await?;
        let shaped = shaper::shape(raw, lineup, keywords);
        let count = shaped.len();
        self.current.store(Arc::new(shaped));
        debug!(channels = count, "catalog reloaded");
        Ok(count)
    }

    /// Replace the raw catalog on disk atomically (temp file + rename) and publish the
    /// shaped result, without requiring a round-trip through the filesystem to see the
    /// update reflected in `snapshot()`.
    pub async fn replace(&self, raw: Catalog, lineup: &LineupConfig, keywords: &LineupKeywords) -> AppResult<usize> {
        Self::write_atomic(&self.path, &raw).await?;
        let shaped = shaper::shape(raw, lineup, keywords);
        let count = shaped.len();
        self.current.store(Arc::new(shaped));
        Ok(count)
    }

    async fn write_atomic(path: &Path, raw: &Catalog) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(raw)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineupConfig;

    #[tokio::test]
    async fn missing_file_yields_empty_catalog() {
        let lineup = LineupConfig::default();
        let keywords = LineupKeywords::default();
        let store = CatalogStore::load("/nonexistent/catalog.json", &lineup, &keywords)
            .await
            .unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn replace_then_find_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let lineup = LineupConfig::default();
        let keywords = LineupKeywords::default();
        let store = CatalogStore::load(&path, &lineup, &keywords).await.unwrap();

        let channel = LiveChannel {
            channel_id: "abc123".to_string(),
            guide_number: "1.1".to_string(),
            guide_name: "Test Channel".to_string(),
            tvg_id: String::new(),
            epg_linked: false,
            group_title: String::new(),
            stream_url: "https://example.com/stream.m3u8".to_string(),
            stream_urls: Vec::new(),
        };

        store
            .replace(vec![channel.clone()], &lineup, &keywords)
            .await
            .unwrap();

        let found = store.find("abc123").expect("channel present after replace");
        assert_eq!(found.guide_name, "Test Channel");
    }

    #[tokio::test]
    async fn find_falls_back_to_guide_number_then_numeric_index() {
        let lineup = LineupConfig::default();
        let keywords = LineupKeywords::default();
        let store = CatalogStore::load("/nonexistent/catalog.json", &lineup, &keywords)
            .await
            .unwrap();

        let channel = LiveChannel {
            channel_id: String::new(),
            guide_number: "7".to_string(),
            guide_name: "Seven".to_string(),
            tvg_id: String::new(),
            epg_linked: false,
            group_title: String::new(),
            stream_url: "https://example.com/seven.m3u8".to_string(),
            stream_urls: Vec::new(),
        };
        store.replace(vec![channel], &lineup, &keywords).await.unwrap();

        assert_eq!(store.find("7").unwrap().guide_name, "Seven");
        assert_eq!(store.find("0").unwrap().guide_name, "Seven");
        assert!(store.find("does-not-exist").is_none());
    }
}
