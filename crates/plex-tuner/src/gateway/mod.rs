//! The live stream gateway: admission control, URL selection/failover, HLS relay, the ffmpeg
//! remux/transcode pipeline, and the adaptive output buffer between them and the client.

pub mod adaptive_writer;
pub mod admission;
pub mod ffmpeg;
pub mod hls_relay;
pub mod session;
pub mod url_select;
