//! The ffmpeg remux/transcode pipeline: command construction, process lifecycle, the
//! IDR-aware startup gate, the PAT/PMT keepalive, and the raw MPEG-TS primitives they share.

pub mod command_builder;
pub mod keepalive;
pub mod mpegts;
pub mod probe;
pub mod process;
pub mod startup_gate;

pub use command_builder::{resolve_host_numeric, FfmpegCommandBuilder};
pub use process::FfmpegProcess;
