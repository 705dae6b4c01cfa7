//! `StreamSession`: per-request transient state for a single `/stream/<id>` request.

use std::time::Instant;
use uuid::Uuid;

use crate::models::StreamMode;

/// Startup-gate progress for the ffmpeg pipeline. Tracked on the session so a
/// structured log line can report what was seen by the time the gate released.
#[derive(Debug, Clone, Default)]
pub struct StartupGateState {
    pub bytes_buffered: usize,
    pub idr_seen: bool,
    pub aac_seen: bool,
}

/// Adaptive-writer state: the dynamic target buffer size and the consecutive
/// fast/slow flush counters that drive its growth/shrink decisions.
#[derive(Debug, Clone)]
pub struct AdaptiveWriterState {
    pub target_bytes: usize,
    pub consecutive_fast_flushes: u32,
}

impl Default for AdaptiveWriterState {
    fn default() -> Self {
        Self {
            target_bytes: super::adaptive_writer::INITIAL_TARGET_BYTES,
            consecutive_fast_flushes: 0,
        }
    }
}

/// Transient, gateway-local state created on each accepted `/stream/...` request.
pub struct StreamSession {
    pub session_id: String,
    pub channel_key: String,
    pub selected_url: Option<String>,
    pub mode: Option<StreamMode>,
    pub started_at: Instant,
    pub startup_gate: StartupGateState,
    pub adaptive_writer: AdaptiveWriterState,
    pub pat_continuity: u8,
    pub pmt_continuity: u8,
}

impl StreamSession {
    pub fn new(channel_key: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            channel_key: channel_key.into(),
            selected_url: None,
            mode: None,
            started_at: Instant::now(),
            startup_gate: StartupGateState::default(),
            adaptive_writer: AdaptiveWriterState::default(),
            pat_continuity: 0,
            pmt_continuity: 0,
        }
    }

    pub fn next_pat_continuity(&mut self) -> u8 {
        let current = self.pat_continuity;
        self.pat_continuity = (self.pat_continuity + 1) % 16;
        current
    }

    pub fn next_pmt_continuity(&mut self) -> u8 {
        let current = self.pmt_continuity;
        self.pmt_continuity = (self.pmt_continuity + 1) % 16;
        current
    }
}
