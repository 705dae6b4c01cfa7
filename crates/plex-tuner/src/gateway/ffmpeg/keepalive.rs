//! PAT/PMT keepalive: while the startup gate is still buffering, emit synthesized PAT
//! and PMT packets at a configurable interval so clients that expect early PSI tables (and
//! middleboxes/players that time out without them) stay happy.

use std::time::Duration;

use tracing::debug;

use super::mpegts;

pub enum KeepaliveStop {
    FfmpegPayloadArrived,
    ClientDisconnected,
    WriteError,
}

impl KeepaliveStop {
    fn reason(&self) -> &'static str {
        match self {
            Self::FfmpegPayloadArrived => "ffmpeg payload arrived",
            Self::ClientDisconnected => "client disconnected",
            Self::WriteError => "write error",
        }
    }
}

/// Emit PAT/PMT packets at `interval` (clamped to a minimum of 100ms per the spec) by
/// invoking `write` for each packet, until `write` returns `false` (meaning stop: client
/// disconnected or a write error) or `should_stop` flips true (ffmpeg payload has arrived).
///
/// Returns the number of ticks emitted and the reason it stopped, for the structured log
/// line callers are expected to emit.
pub async fn run<F, S>(interval: Duration, mut write: F, mut should_stop: S) -> (u64, KeepaliveStop)
where
    F: FnMut([u8; 188]) -> bool,
    S: FnMut() -> bool,
{
    let interval = interval.max(Duration::from_millis(100));
    let mut ticker = tokio::time::interval(interval);
    let mut pat_cc: u8 = 0;
    let mut pmt_cc: u8 = 0;
    let mut ticks: u64 = 0;

    loop {
        ticker.tick().await;

        if should_stop() {
            return (ticks, KeepaliveStop::FfmpegPayloadArrived);
        }

        let pat = mpegts::build_pat_packet(pat_cc);
        pat_cc = (pat_cc + 1) % 16;
        if !write(pat) {
            return (ticks, KeepaliveStop::WriteError);
        }

        let pmt = mpegts::build_pmt_packet(pmt_cc);
        pmt_cc = (pmt_cc + 1) % 16;
        if !write(pmt) {
            return (ticks, KeepaliveStop::WriteError);
        }

        ticks += 1;
    }
}

pub fn log_stop(ticks: u64, stop: &KeepaliveStop) {
    debug!(ticks, reason = stop.reason(), "PAT/PMT keepalive stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn stops_when_payload_arrives() {
        let writes = Arc::new(AtomicUsize::new(0));
        let writes_clone = writes.clone();
        let ticks_seen = Arc::new(AtomicUsize::new(0));
        let ticks_clone = ticks_seen.clone();

        let (ticks, stop) = run(
            Duration::from_millis(100),
            move |_packet| {
                writes_clone.fetch_add(1, Ordering::SeqCst);
                true
            },
            move || ticks_clone.fetch_add(1, Ordering::SeqCst) >= 2,
        )
        .await;

        assert!(matches!(stop, KeepaliveStop::FfmpegPayloadArrived));
        assert_eq!(ticks, 2);
        assert_eq!(writes.load(Ordering::SeqCst), 4); // PAT + PMT per tick, 2 ticks
    }

    #[tokio::test]
    async fn stops_on_write_error() {
        let (ticks, stop) = run(Duration::from_millis(100), |_packet| false, || false).await;
        assert!(matches!(stop, KeepaliveStop::WriteError));
        assert_eq!(ticks, 0);
    }
}
