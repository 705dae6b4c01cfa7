//! Builds the `ffmpeg` argument vector for the remux and transcode pipelines.

use tokio::net::lookup_host;
use tracing::debug;
use url::Url;

use crate::models::StreamMode;

/// Resolve `url`'s host to a numeric address and rewrite the URL with it, in-process,
/// before handing an HLS input to ffmpeg. A container short-name such as
/// `name.namespace.svc` can otherwise stall ffmpeg's HLS demuxer, which does its own
/// (sometimes flakier) resolution. Falls back to the original URL unchanged if the host is
/// already numeric, parsing fails, or the lookup itself fails.
pub async fn resolve_host_numeric(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str().map(str::to_string) else {
        return url.to_string();
    };
    if host.parse::<std::net::IpAddr>().is_ok() {
        return url.to_string();
    }

    let port = parsed.port_or_known_default().unwrap_or(80);
    match lookup_host((host.as_str(), port)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => {
                if parsed.set_host(Some(&addr.ip().to_string())).is_ok() {
                    parsed.to_string()
                } else {
                    url.to_string()
                }
            }
            None => url.to_string(),
        },
        Err(e) => {
            debug!(error = %e, host, "DNS lookup for ffmpeg HLS input failed, using original host");
            url.to_string()
        }
    }
}

pub struct FfmpegCommandBuilder;

impl FfmpegCommandBuilder {
    /// `input_url` must already have any hostname resolved to a numeric address (a
    /// container short-name such as `name.namespace.svc` can otherwise stall ffmpeg's HLS
    /// demuxer) and reconnect behavior decided by the caller.
    pub fn build_args(mode: StreamMode, input_url: &str, hls_reconnect: bool) -> Vec<String> {
        match mode {
            StreamMode::FfmpegRemux => Self::remux_args(input_url, hls_reconnect),
            StreamMode::FfmpegTranscode => Self::transcode_args(input_url, hls_reconnect),
            StreamMode::PassThrough | StreamMode::HlsRelay => {
                unreachable!("ffmpeg command builder only handles remux/transcode modes")
            }
        }
    }

    fn common_input_args(input_url: &str, hls_reconnect: bool) -> Vec<String> {
        let mut args = vec!["-hide_banner".to_string(), "-loglevel".to_string(), "warning".to_string()];
        if hls_reconnect {
            args.extend(["-reconnect".to_string(), "1".to_string(), "-reconnect_streamed".to_string(), "1".to_string()]);
        }
        args.extend(["-i".to_string(), input_url.to_string()]);
        args
    }

    fn remux_args(input_url: &str, hls_reconnect: bool) -> Vec<String> {
        let mut args = Self::common_input_args(input_url, hls_reconnect);
        args.extend(
            [
                "-c", "copy",
                "-f", "mpegts",
                "-mpegts_flags", "+resend_headers",
                "-muxdelay", "0",
                "-muxpreload", "0",
                "pipe:1",
            ]
            .map(String::from),
        );
        args
    }

    fn transcode_args(input_url: &str, hls_reconnect: bool) -> Vec<String> {
        let mut args = Self::common_input_args(input_url, hls_reconnect);
        args.extend(
            [
                "-c:v", "libx264",
                "-preset", "veryfast",
                "-tune", "zerolatency",
                "-g", "50",
                "-b:v", "3.5M",
                "-maxrate", "4M",
                "-bufsize", "8M",
                "-af", "aresample=async=1:first_pts=0",
                "-c:a", "aac",
                "-profile:a", "aac_low",
                "-ac", "2",
                "-ar", "48000",
                "-b:a", "128k",
                "-f", "mpegts",
                "-mpegts_flags", "+resend_headers",
                "-muxdelay", "0",
                "-muxpreload", "0",
                "pipe:1",
            ]
            .map(String::from),
        );
        args
    }
}
