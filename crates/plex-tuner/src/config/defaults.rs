//! Default values used by `#[serde(default = "...")]` fields in `Config`.
//!
//! Kept in their own module the way the project's established config layer keeps its
//! `default_*` helpers separate from the struct definitions, so the defaults read as a
//! single reference table.

use std::time::Duration;

pub fn default_device_id() -> String {
    "plextuner01".to_string()
}

pub fn default_friendly_name() -> String {
    "Plex Tuner".to_string()
}

pub fn default_tuner_count() -> u32 {
    2
}

pub fn default_true() -> bool {
    true
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    5004
}

pub fn default_catalog_path() -> String {
    "./data/catalog.json".to_string()
}

pub fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

pub fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

pub fn default_buffer_bytes() -> i64 {
    -1
}

pub fn default_startup_gate_bytes_budget() -> usize {
    512 * 1024
}

pub fn default_startup_gate_timeout() -> Duration {
    Duration::from_secs(5)
}

pub fn default_keepalive_interval() -> Duration {
    Duration::from_millis(250)
}

pub fn default_hls_stall_timeout() -> Duration {
    Duration::from_secs(12)
}

pub fn default_max_channels() -> i64 {
    480
}

pub fn default_region_profile() -> String {
    "na".to_string()
}

pub fn default_xmltv_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

pub fn default_xmltv_fetch_timeout() -> Duration {
    Duration::from_secs(45)
}

pub fn default_source_info_name() -> String {
    "plex-tuner".to_string()
}

pub fn default_restart_delay() -> Duration {
    Duration::from_secs(2)
}

pub fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

pub fn default_retry_after_cap() -> Duration {
    Duration::from_secs(60)
}

pub fn default_catalog_refresh_interval() -> Duration {
    Duration::from_secs(5 * 60)
}
