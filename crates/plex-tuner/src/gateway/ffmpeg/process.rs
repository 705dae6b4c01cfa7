//! Spawns and manages the `ffmpeg` child process for the remux/transcode pipeline.

use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// A running ffmpeg subprocess. Its stdout is the MPEG-TS byte stream to forward to the
/// client; stderr is drained in the background and logged at debug level so ffmpeg's own
/// diagnostics don't block on a full pipe.
pub struct FfmpegProcess {
    child: Child,
    stdout: Option<ChildStdout>,
}

impl FfmpegProcess {
    pub fn spawn(ffmpeg_path: &str, args: &[String]) -> AppResult<Self> {
        let mut command = Command::new(ffmpeg_path);
        command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| AppError::ffmpeg(format!("failed to spawn {ffmpeg_path}: {e}")))?;

        let stdout = child.stdout.take();
        if let Some(stderr) = child.stderr.take() {
            spawn_stderr_drain(stderr);
        }

        Ok(Self { child, stdout })
    }

    /// Takes ownership of stdout for streaming; can only be called once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!(error = %e, "ffmpeg kill failed (process likely already exited)");
        }
    }
}

fn spawn_stderr_drain(stderr: impl AsyncRead + Unpin + Send + 'static) {
    use tokio::io::{AsyncBufReadExt, BufReader};
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if !line.is_empty() {
                debug!(target: "ffmpeg", "{line}");
            }
        }
    });
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        if let Err(e) = self.child.start_kill() {
            warn!(error = %e, "failed to start_kill lingering ffmpeg process on drop");
        }
    }
}
