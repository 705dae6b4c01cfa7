//! Layered configuration: compiled-in defaults, an optional TOML file, then
//! `PLEX_TUNER_`-prefixed environment variables (last wins), loaded with `figment` the way
//! the project's established config layer does.

pub mod defaults;
pub mod duration_serde;
pub mod keywords;

use defaults::*;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::models::TranscodeMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_friendly_name")]
    pub friendly_name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub firmware_name: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub device_auth: Option<String>,
    #[serde(default = "default_tuner_count")]
    pub tuner_count: u32,
    /// `ScanPossible` in `/lineup_status.json`. Defaults to true; set false to keep a
    /// category sub-tuner out of Plex's HDHR setup wizard.
    #[serde(default = "default_true")]
    pub hdhr_scan_possible: bool,
    /// Append `?ptnonce=<base36 nanos>` to lineup stream URLs.
    #[serde(default)]
    pub lineup_nonce: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub ssdp_disabled: bool,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    /// How often the catalog file is re-read and re-shaped in the background, so an
    /// external indexer's updates are picked up without a restart. Zero disables the loop.
    #[serde(default = "default_catalog_refresh_interval", with = "duration_serde")]
    pub catalog_refresh_interval: Duration,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub lineup: LineupConfig,
    #[serde(default)]
    pub xmltv: XmltvConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            device_id: default_device_id(),
            friendly_name: default_friendly_name(),
            manufacturer: None,
            model_number: None,
            firmware_name: None,
            firmware_version: None,
            device_auth: None,
            tuner_count: default_tuner_count(),
            hdhr_scan_possible: true,
            lineup_nonce: false,
            host: default_host(),
            port: default_port(),
            ssdp_disabled: false,
            catalog_path: default_catalog_path(),
            catalog_refresh_interval: default_catalog_refresh_interval(),
            stream: StreamConfig::default(),
            lineup: LineupConfig::default(),
            xmltv: XmltvConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub transcode_mode: TranscodeMode,
    /// 0 = passthrough, -1 = adaptive, >0 = fixed buffer size in bytes.
    #[serde(default = "default_buffer_bytes")]
    pub buffer_bytes: i64,
    /// Whether ffmpeg's HLS demuxer is told to reconnect on playlist EOF. Default false:
    /// reconnecting on a genuinely-ended playlist just loops forever.
    #[serde(default)]
    pub ffmpeg_hls_reconnect: bool,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
    /// If true, a startup gate that never sees an IDR within budget fails the URL instead
    /// of releasing anyway.
    #[serde(default)]
    pub require_good_start: bool,
    #[serde(default = "default_startup_gate_bytes_budget")]
    pub startup_gate_bytes_budget: usize,
    #[serde(default = "default_startup_gate_timeout", with = "duration_serde")]
    pub startup_gate_timeout: Duration,
    #[serde(default = "default_keepalive_interval", with = "duration_serde")]
    pub keepalive_interval: Duration,
    #[serde(default = "default_hls_stall_timeout", with = "duration_serde")]
    pub hls_stall_timeout: Duration,
    #[serde(default)]
    pub provider_user: Option<String>,
    #[serde(default)]
    pub provider_pass: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            transcode_mode: TranscodeMode::default(),
            buffer_bytes: default_buffer_bytes(),
            ffmpeg_hls_reconnect: false,
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            require_good_start: false,
            startup_gate_bytes_budget: default_startup_gate_bytes_budget(),
            startup_gate_timeout: default_startup_gate_timeout(),
            keepalive_interval: default_keepalive_interval(),
            hls_stall_timeout: default_hls_stall_timeout(),
            provider_user: None,
            provider_pass: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupConfig {
    /// 480 default, 479 in "easy" mode, -1 for no cap (programmatic/injected DVR sync).
    #[serde(default = "default_max_channels")]
    pub max_channels: i64,
    #[serde(default)]
    pub easy_mode: bool,
    #[serde(default)]
    pub guide_number_offset: i64,
    #[serde(default = "default_true")]
    pub drop_music_radio: bool,
    /// Accepted language tokens; empty means "don't filter by language".
    #[serde(default)]
    pub language_allow: Vec<String>,
    #[serde(default)]
    pub exclude_regex: Option<String>,
    #[serde(default)]
    pub category_filter: Option<String>,
    #[serde(default = "default_region_profile")]
    pub region_profile: String,
    #[serde(default)]
    pub epg_prune: bool,
    #[serde(default)]
    pub shard_skip: usize,
    #[serde(default)]
    pub shard_take: Option<usize>,
    #[serde(default)]
    pub keywords_path: Option<String>,
}

impl Default for LineupConfig {
    fn default() -> Self {
        Self {
            max_channels: default_max_channels(),
            easy_mode: false,
            guide_number_offset: 0,
            drop_music_radio: true,
            language_allow: Vec::new(),
            exclude_regex: None,
            category_filter: None,
            region_profile: default_region_profile(),
            epg_prune: false,
            shard_skip: 0,
            shard_take: None,
            keywords_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmltvConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_xmltv_ttl", with = "duration_serde")]
    pub ttl: Duration,
    #[serde(default = "default_xmltv_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    #[serde(default)]
    pub latin_preference: bool,
    #[serde(default)]
    pub non_latin_title_fallback: bool,
    #[serde(default)]
    pub dummy_guide: bool,
    #[serde(default = "default_source_info_name")]
    pub source_info_name: String,
}

impl Default for XmltvConfig {
    fn default() -> Self {
        Self {
            url: None,
            ttl: default_xmltv_ttl(),
            fetch_timeout: default_xmltv_fetch_timeout(),
            preferred_languages: Vec::new(),
            latin_preference: true,
            non_latin_title_fallback: false,
            dummy_guide: false,
            source_info_name: default_source_info_name(),
        }
    }
}

impl Config {
    /// Load the layered configuration: compiled-in defaults < optional TOML file <
    /// `PLEX_TUNER_`-prefixed env vars.
    pub fn load(toml_path: Option<&str>) -> AppResult<Self> {
        let defaults = Config::compiled_defaults();
        let mut figment = Figment::from(Serialized::defaults(defaults));

        if let Some(path) = toml_path {
            if std::path::Path::new(path).exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("PLEX_TUNER_").split("__"));

        figment
            .extract()
            .map_err(|e| AppError::configuration(format!("failed to load configuration: {e}")))
    }

    pub(crate) fn compiled_defaults() -> Self {
        Self::default()
    }

    pub fn effective_tuner_count(&self) -> u32 {
        if self.tuner_count == 0 {
            default_tuner_count()
        } else {
            self.tuner_count
        }
    }

    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:5004".to_string())
    }

    pub fn effective_max_channels(&self) -> i64 {
        if self.lineup.easy_mode && self.lineup.max_channels == default_max_channels() {
            479
        } else {
            self.lineup.max_channels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = Config::compiled_defaults();
        assert_eq!(cfg.effective_base_url(), "http://localhost:5004");
        assert_eq!(cfg.device_id, "plextuner01");
        assert_eq!(cfg.effective_tuner_count(), 2);
        assert_eq!(cfg.effective_max_channels(), 480);
    }

    #[test]
    fn easy_mode_caps_at_479() {
        let mut cfg = Config::compiled_defaults();
        cfg.lineup.easy_mode = true;
        assert_eq!(cfg.effective_max_channels(), 479);
    }

    #[test]
    fn zero_tuner_count_falls_back_to_two() {
        let mut cfg = Config::compiled_defaults();
        cfg.tuner_count = 0;
        assert_eq!(cfg.effective_tuner_count(), 2);
    }
}
