//! Adaptive writer: a dynamically sized buffer interposed between the upstream source
//! (ffmpeg stdout or a relayed HTTP body) and the client response, which reacts to flush
//! timing to chase the client's actual drain rate.

use std::time::Duration;

pub const INITIAL_TARGET_BYTES: usize = 1024 * 1024;
pub const MIN_TARGET_BYTES: usize = 64 * 1024;
pub const MAX_TARGET_BYTES: usize = 2 * 1024 * 1024;

const SLOW_FLUSH_THRESHOLD: Duration = Duration::from_millis(100);
const FAST_FLUSH_THRESHOLD: Duration = Duration::from_millis(20);
const FAST_FLUSHES_TO_HALVE: u32 = 3;

/// Buffer size policy selected by `StreamConfig::buffer_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPolicy {
    /// `0`: pass each chunk straight through without buffering.
    PassThrough,
    /// `-1`: dynamically size the buffer based on flush timing.
    Adaptive,
    /// `>0`: a fixed-size buffer.
    Fixed(usize),
}

impl BufferPolicy {
    pub fn from_config_value(value: i64) -> Self {
        match value {
            0 => Self::PassThrough,
            n if n < 0 => Self::Adaptive,
            n => Self::Fixed(n as usize),
        }
    }
}

/// The mutable state an adaptive buffer carries across flushes for one stream session.
#[derive(Debug, Clone)]
pub struct AdaptiveState {
    target_bytes: usize,
    consecutive_fast_flushes: u32,
}

impl Default for AdaptiveState {
    fn default() -> Self {
        Self {
            target_bytes: INITIAL_TARGET_BYTES,
            consecutive_fast_flushes: 0,
        }
    }
}

impl AdaptiveState {
    pub fn target_bytes(&self) -> usize {
        self.target_bytes
    }

    /// Record how long the most recent flush took and adjust the target size for the next
    /// one. A flush at or above 100ms doubles the target (client is slow to drain, so batch
    /// more before the next write); three flushes in a row at or under 20ms halves it
    /// (client is keeping up easily, so reduce latency by buffering less). Flushes in
    /// between reset the fast-streak counter without changing the target.
    pub fn record_flush(&mut self, elapsed: Duration) {
        if elapsed >= SLOW_FLUSH_THRESHOLD {
            self.target_bytes = (self.target_bytes * 2).min(MAX_TARGET_BYTES);
            self.consecutive_fast_flushes = 0;
        } else if elapsed <= FAST_FLUSH_THRESHOLD {
            self.consecutive_fast_flushes += 1;
            if self.consecutive_fast_flushes >= FAST_FLUSHES_TO_HALVE {
                self.target_bytes = (self.target_bytes / 2).max(MIN_TARGET_BYTES);
                self.consecutive_fast_flushes = 0;
            }
        } else {
            self.consecutive_fast_flushes = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_config_value() {
        assert_eq!(BufferPolicy::from_config_value(0), BufferPolicy::PassThrough);
        assert_eq!(BufferPolicy::from_config_value(-1), BufferPolicy::Adaptive);
        assert_eq!(BufferPolicy::from_config_value(4096), BufferPolicy::Fixed(4096));
    }

    #[test]
    fn slow_flush_doubles_target_up_to_max() {
        let mut state = AdaptiveState::default();
        state.record_flush(Duration::from_millis(150));
        assert_eq!(state.target_bytes(), INITIAL_TARGET_BYTES * 2);

        for _ in 0..10 {
            state.record_flush(Duration::from_millis(150));
        }
        assert_eq!(state.target_bytes(), MAX_TARGET_BYTES);
    }

    #[test]
    fn three_fast_flushes_in_a_row_halve_the_target() {
        let mut state = AdaptiveState::default();
        state.record_flush(Duration::from_millis(10));
        state.record_flush(Duration::from_millis(10));
        assert_eq!(state.target_bytes(), INITIAL_TARGET_BYTES);
        state.record_flush(Duration::from_millis(10));
        assert_eq!(state.target_bytes(), INITIAL_TARGET_BYTES / 2);
    }

    #[test]
    fn mid_range_flush_resets_fast_streak() {
        let mut state = AdaptiveState::default();
        state.record_flush(Duration::from_millis(10));
        state.record_flush(Duration::from_millis(10));
        state.record_flush(Duration::from_millis(50));
        state.record_flush(Duration::from_millis(10));
        state.record_flush(Duration::from_millis(10));
        // Only two fast flushes since the mid-range reset; target should be unchanged.
        assert_eq!(state.target_bytes(), INITIAL_TARGET_BYTES);
    }

    #[test]
    fn target_floors_at_min() {
        let mut state = AdaptiveState::default();
        for _ in 0..60 {
            state.record_flush(Duration::from_millis(5));
        }
        assert_eq!(state.target_bytes(), MIN_TARGET_BYTES);
    }
}
