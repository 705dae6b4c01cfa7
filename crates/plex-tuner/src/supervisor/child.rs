//! Spawns and supervises a single child tuner instance: line-prefixed stdout/stderr
//! forwarding and restart-on-exit, built on the same `tokio::process::Command`/`Child`
//! idiom the stream gateway uses for its ffmpeg subprocess (see
//! `crate::gateway::ffmpeg::process`).

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::config::Instance;
use super::env;
use crate::errors::{AppError, AppResult};

/// Runs `instance` until `cancel` fires, restarting it after `restart_delay` on every exit
/// when `restart` is true. Returns once supervision of this one instance is over.
pub async fn run_instance(
    tuner_binary: &str,
    instance: Instance,
    restart: bool,
    restart_delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        match spawn_and_wait(tuner_binary, &instance, &cancel).await {
            Ok(status) => info!(instance = %instance.name, %status, "child exited"),
            Err(e) => error!(instance = %instance.name, error = %e, "child failed"),
        }

        if cancel.is_cancelled() || !restart {
            return;
        }

        info!(instance = %instance.name, delay = ?restart_delay, "restarting child after delay");
        tokio::select! {
            _ = tokio::time::sleep(restart_delay) => {}
            _ = cancel.cancelled() => return,
        }
    }
}

async fn spawn_and_wait(tuner_binary: &str, instance: &Instance, cancel: &CancellationToken) -> AppResult<ExitStatus> {
    let mut command = Command::new(tuner_binary);
    command.args(&instance.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let child_env = env::build_child_env(std::env::vars(), &instance.env);
    command.env_clear().envs(child_env);

    if let Some(dir) = &instance.dir {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| AppError::supervisor(format!("failed to spawn instance {}: {e}", instance.name)))?;

    if let Some(stdout) = child.stdout.take() {
        spawn_line_forwarder(instance.name.clone(), stdout, false);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_forwarder(instance.name.clone(), stderr, true);
    }

    tokio::select! {
        status = child.wait() => return status.map_err(AppError::Io),
        _ = cancel.cancelled() => {
            let _ = child.start_kill();
        }
    }

    child.wait().await.map_err(AppError::Io)
}

fn spawn_line_forwarder(name: String, pipe: impl AsyncRead + Unpin + Send + 'static, is_stderr: bool) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                warn!(target: "supervisor::child", "[{name}] {line}");
            } else {
                info!(target: "supervisor::child", "[{name}] {line}");
            }
        }
    });
}
