//! Core data model: the channel catalog and the transient state of a live stream request.

use serde::{Deserialize, Serialize};

/// A single entry in the tuner's channel table.
///
/// `ChannelID` is preferred in stream URLs because it is stable across catalog reloads;
/// `GuideNumber` is what Plex shows to the user and may be remapped by a guide-number
/// offset (see `crate::lineup::offset`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveChannel {
    #[serde(default)]
    pub channel_id: String,
    pub guide_number: String,
    pub guide_name: String,
    #[serde(default)]
    pub tvg_id: String,
    #[serde(default)]
    pub epg_linked: bool,
    #[serde(default)]
    pub group_title: String,
    #[serde(default)]
    pub stream_url: String,
    #[serde(default)]
    pub stream_urls: Vec<String>,
}

impl LiveChannel {
    /// The ordered list of upstream URLs to attempt for this channel: `stream_urls` if
    /// non-empty, otherwise the single `stream_url`.
    pub fn candidate_urls(&self) -> Vec<&str> {
        if !self.stream_urls.is_empty() {
            self.stream_urls.iter().map(String::as_str).collect()
        } else if !self.stream_url.is_empty() {
            vec![self.stream_url.as_str()]
        } else {
            Vec::new()
        }
    }

    /// The key by which this channel is addressed in `/stream/<key>`: the stable
    /// `ChannelID` if present, else the `GuideNumber`.
    pub fn stream_key(&self) -> &str {
        if !self.channel_id.is_empty() {
            &self.channel_id
        } else {
            &self.guide_number
        }
    }
}

/// An ordered sequence of channels, as loaded from or about to be written to the catalog
/// file on disk.
pub type Catalog = Vec<LiveChannel>;

/// The transport mode selected for a single `/stream` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    PassThrough,
    HlsRelay,
    FfmpegRemux,
    FfmpegTranscode,
}

impl std::fmt::Display for StreamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StreamMode::PassThrough => "passthrough",
            StreamMode::HlsRelay => "hls-relay",
            StreamMode::FfmpegRemux => "ffmpeg-remux",
            StreamMode::FfmpegTranscode => "ffmpeg-transcode",
        };
        f.write_str(s)
    }
}

/// ffmpeg transcode policy, configured globally but resolved per-stream in `auto` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscodeMode {
    Off,
    On,
    #[default]
    Auto,
}

impl std::str::FromStr for TranscodeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "on" => Ok(Self::On),
            "auto" => Ok(Self::Auto),
            other => Err(format!("invalid transcode mode: {other}")),
        }
    }
}
