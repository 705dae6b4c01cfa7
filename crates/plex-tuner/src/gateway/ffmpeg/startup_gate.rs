//! Startup gate: buffer ffmpeg stdout until an IDR (and optionally AAC sync) is seen or
//! a byte/time budget is exhausted, so the client's first bytes aren't a black GOP.

use std::time::{Duration, Instant};

use super::mpegts;
use crate::errors::{AppError, AppResult};

pub struct StartupGateResult {
    pub buffered: Vec<u8>,
    pub idr_seen: bool,
    pub aac_seen: bool,
}

pub struct StartupGateConfig {
    pub bytes_budget: usize,
    pub timeout: Duration,
    pub require_good_start: bool,
}

/// Feed chunks to `gate.accumulate()` as they arrive from ffmpeg stdout; call `finished()`
/// once the byte budget or timeout is reached to get the buffered bytes back (to replay to
/// the client ahead of the live tail) along with what was observed.
pub struct StartupGate {
    config: StartupGateConfig,
    buffer: Vec<u8>,
    idr_seen: bool,
    aac_seen: bool,
    started_at: Instant,
}

impl StartupGate {
    pub fn new(config: StartupGateConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            idr_seen: false,
            aac_seen: false,
            started_at: Instant::now(),
        }
    }

    /// Returns true once the gate should release: either enough bytes have accumulated
    /// (with at least the IDR condition satisfied) or the timeout has elapsed.
    pub fn accumulate(&mut self, chunk: &[u8]) -> bool {
        self.buffer.extend_from_slice(chunk);
        if !self.idr_seen {
            self.idr_seen = mpegts::contains_h264_idr(&self.buffer);
        }
        if !self.aac_seen {
            self.aac_seen = mpegts::contains_aac_adts_syncword(&self.buffer);
        }

        let budget_reached = self.buffer.len() >= self.config.bytes_budget && self.idr_seen;
        let timed_out = self.started_at.elapsed() >= self.config.timeout;
        budget_reached || timed_out
    }

    /// Consume the gate, returning the buffered bytes and what was observed. If
    /// `require_good_start` was set and no IDR appeared, returns an error instead so the
    /// caller can fail this URL over to the next candidate.
    pub fn finish(self) -> AppResult<StartupGateResult> {
        if self.config.require_good_start && !self.idr_seen {
            return Err(AppError::ffmpeg("startup gate timed out without observing an IDR frame"));
        }
        Ok(StartupGateResult {
            buffered: self.buffer,
            idr_seen: self.idr_seen,
            aac_seen: self.aac_seen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idr_chunk() -> Vec<u8> {
        vec![0x00, 0x00, 0x00, 0x01, 0x65, 0xAA, 0xBB]
    }

    #[test]
    fn releases_once_idr_seen_and_budget_reached() {
        let mut gate = StartupGate::new(StartupGateConfig {
            bytes_budget: 4,
            timeout: Duration::from_secs(5),
            require_good_start: false,
        });
        assert!(gate.accumulate(&idr_chunk()));
        let result = gate.finish().unwrap();
        assert!(result.idr_seen);
    }

    #[test]
    fn does_not_release_before_budget_without_timeout() {
        let mut gate = StartupGate::new(StartupGateConfig {
            bytes_budget: 1_000_000,
            timeout: Duration::from_secs(30),
            require_good_start: false,
        });
        assert!(!gate.accumulate(&idr_chunk()));
    }

    #[test]
    fn require_good_start_errors_when_no_idr_observed() {
        let gate = StartupGate::new(StartupGateConfig {
            bytes_budget: 1,
            timeout: Duration::from_millis(1),
            require_good_start: true,
        });
        let result = gate.finish();
        assert!(result.is_err());
    }

    #[test]
    fn lenient_mode_releases_without_idr() {
        let gate = StartupGate::new(StartupGateConfig {
            bytes_budget: 1,
            timeout: Duration::from_millis(1),
            require_good_start: false,
        });
        let result = gate.finish().unwrap();
        assert!(!result.idr_seen);
    }
}
