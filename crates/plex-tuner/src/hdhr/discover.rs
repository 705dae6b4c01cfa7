//! `/discover.json`, `/lineup.json`, `/lineup_status.json` response bodies.

use serde::Serialize;

use crate::config::Config;
use crate::models::LiveChannel;

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverResponse {
    #[serde(rename = "FriendlyName")]
    pub friendly_name: String,
    #[serde(rename = "BaseURL")]
    pub base_url: String,
    #[serde(rename = "LineupURL")]
    pub lineup_url: String,
    #[serde(rename = "TunerCount")]
    pub tuner_count: u32,
    #[serde(rename = "DeviceID")]
    pub device_id: String,
    #[serde(rename = "Manufacturer", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(rename = "ModelNumber", skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,
    #[serde(rename = "FirmwareName", skip_serializing_if = "Option::is_none")]
    pub firmware_name: Option<String>,
    #[serde(rename = "FirmwareVersion", skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(rename = "DeviceAuth", skip_serializing_if = "Option::is_none")]
    pub device_auth: Option<String>,
}

impl DiscoverResponse {
    pub fn from_config(config: &Config) -> Self {
        let base_url = config.effective_base_url();
        Self {
            friendly_name: config.friendly_name.clone(),
            lineup_url: format!("{base_url}/lineup.json"),
            base_url,
            tuner_count: config.effective_tuner_count(),
            device_id: config.device_id.clone(),
            manufacturer: config.manufacturer.clone(),
            model_number: config.model_number.clone(),
            firmware_name: config.firmware_name.clone(),
            firmware_version: config.firmware_version.clone(),
            device_auth: config.device_auth.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupStatus {
    #[serde(rename = "ScanInProgress")]
    pub scan_in_progress: u8,
    #[serde(rename = "ScanPossible")]
    pub scan_possible: u8,
}

impl LineupStatus {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scan_in_progress: 0,
            scan_possible: u8::from(config.hdhr_scan_possible),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupEntry {
    #[serde(rename = "GuideNumber")]
    pub guide_number: String,
    #[serde(rename = "GuideName")]
    pub guide_name: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl LineupEntry {
    /// Build the lineup entry list from the current catalog snapshot. `index` is the
    /// channel's position in the snapshot, used as the numeric fallback stream id when
    /// `ChannelID` is empty.
    pub fn build_lineup(channels: &[LiveChannel], base_url: &str, nonce: bool) -> Vec<Self> {
        channels
            .iter()
            .enumerate()
            .map(|(index, channel)| {
                let stream_id = if !channel.channel_id.is_empty() {
                    channel.channel_id.clone()
                } else {
                    index.to_string()
                };
                let mut url = format!("{base_url}/stream/{stream_id}");
                if nonce {
                    url.push_str("?ptnonce=");
                    url.push_str(&crate::utils::b36::encode_nanos());
                }
                Self {
                    guide_number: channel.guide_number.clone(),
                    guide_name: channel.guide_name.clone(),
                    url,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, number: &str) -> LiveChannel {
        LiveChannel {
            channel_id: id.to_string(),
            guide_number: number.to_string(),
            guide_name: "Test".to_string(),
            tvg_id: String::new(),
            epg_linked: false,
            group_title: String::new(),
            stream_url: String::new(),
            stream_urls: Vec::new(),
        }
    }

    #[test]
    fn discover_defaults_match_spec() {
        let config = Config::compiled_defaults();
        let resp = DiscoverResponse::from_config(&config);
        assert_eq!(resp.base_url, "http://localhost:5004");
        assert_eq!(resp.device_id, "plextuner01");
        assert_eq!(resp.tuner_count, 2);
        assert_eq!(resp.lineup_url, "http://localhost:5004/lineup.json");
    }

    #[test]
    fn lineup_falls_back_to_numeric_index_when_channel_id_empty() {
        let channels = vec![channel("", "5")];
        let entries = LineupEntry::build_lineup(&channels, "http://localhost:5004", false);
        assert_eq!(entries[0].url, "http://localhost:5004/stream/0");
    }

    #[test]
    fn lineup_prefers_channel_id() {
        let channels = vec![channel("abc123", "5")];
        let entries = LineupEntry::build_lineup(&channels, "http://localhost:5004", false);
        assert_eq!(entries[0].url, "http://localhost:5004/stream/abc123");
    }

    #[test]
    fn nonce_appends_query_param() {
        let channels = vec![channel("abc123", "5")];
        let entries = LineupEntry::build_lineup(&channels, "http://localhost:5004", true);
        assert!(entries[0].url.contains("?ptnonce="));
    }
}
