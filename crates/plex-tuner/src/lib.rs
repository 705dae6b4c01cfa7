//! HDHomeRun-compatible tuner emulator and live IPTV stream gateway for Plex.
//!
//! `catalog` holds the loaded channel table; `lineup` shapes it into what Plex sees;
//! `hdhr` and `m3u` expose that shape as discovery/playlist documents; `xmltv` serves the
//! guide; `gateway` is the live stream path; `supervisor` optionally runs several tuner
//! instances in one process; `web` wires all of the above into an HTTP server.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod hdhr;
pub mod lineup;
pub mod m3u;
pub mod models;
pub mod supervisor;
pub mod utils;
pub mod web;
pub mod xmltv;
