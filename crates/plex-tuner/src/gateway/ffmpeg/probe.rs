//! Mode selection: in `auto` transcode policy, probe once with `ffprobe` and decide
//! remux vs transcode based on whether the codecs are "Plex-friendly".

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::models::{StreamMode, TranscodeMode};

const FRIENDLY_VIDEO_CODECS: &[&str] = &["h264", "mpeg2video", "mpeg4"];
const FRIENDLY_AUDIO_CODECS: &[&str] = &["aac", "ac3", "eac3", "mp2", "mp3"];

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: String,
}

/// Resolve the `StreamMode` for this request given the configured transcode policy. `off`
/// and `on` are unconditional; `auto` probes once and falls back to transcode on probe
/// failure (a codec we can't identify is not one we can trust Plex to play).
pub async fn resolve_mode(policy: TranscodeMode, ffprobe_path: &str, input_url: &str) -> StreamMode {
    match policy {
        TranscodeMode::Off => StreamMode::FfmpegRemux,
        TranscodeMode::On => StreamMode::FfmpegTranscode,
        TranscodeMode::Auto => {
            if is_plex_friendly(ffprobe_path, input_url).await {
                StreamMode::FfmpegRemux
            } else {
                StreamMode::FfmpegTranscode
            }
        }
    }
}

async fn is_plex_friendly(ffprobe_path: &str, input_url: &str) -> bool {
    let output = Command::new(ffprobe_path)
        .args(["-v", "error", "-show_streams", "-of", "json", input_url])
        .output()
        .await;

    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            debug!(status = %o.status, "ffprobe exited non-zero, assuming transcode required");
            return false;
        }
        Err(e) => {
            debug!(error = %e, "ffprobe failed to run, assuming transcode required");
            return false;
        }
    };

    let parsed: Result<FfprobeOutput, _> = serde_json::from_slice(&output.stdout);
    match parsed {
        Ok(probe) => probe.streams.iter().all(|stream| match stream.codec_type.as_str() {
            "video" => FRIENDLY_VIDEO_CODECS.contains(&stream.codec_name.as_str()),
            "audio" => FRIENDLY_AUDIO_CODECS.contains(&stream.codec_name.as_str()),
            _ => true,
        }),
        Err(e) => {
            debug!(error = %e, "failed to parse ffprobe output, assuming transcode required");
            false
        }
    }
}
