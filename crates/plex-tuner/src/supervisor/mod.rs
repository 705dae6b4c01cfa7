//! The supervisor: launches the child tuner instances named in a `SupervisorConfig` in one
//! process, each with a sanitized environment and `[name]`-prefixed log forwarding, and
//! restarts them on exit per the configured policy.

pub mod child;
pub mod config;
pub mod env;

pub use config::{Instance, SupervisorConfig};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs every configured instance concurrently until `cancel` fires, then waits for all of
/// them to finish exiting before returning. `tuner_binary` is prepended as the program for
/// each instance; `instance.args` become its argv.
pub async fn run(tuner_binary: &str, config: SupervisorConfig, cancel: CancellationToken) {
    let mut tasks = JoinSet::new();
    for instance in config.instances {
        let name = instance.name.clone();
        let tuner_binary = tuner_binary.to_string();
        let restart = config.restart;
        let restart_delay = config.restart_delay;
        let instance_cancel = cancel.clone();
        tasks.spawn(async move {
            child::run_instance(&tuner_binary, instance, restart, restart_delay, instance_cancel).await;
            name
        });
    }

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(name) => info!(instance = %name, "supervised instance stopped"),
            Err(e) => error!(error = %e, "supervised instance task panicked"),
        }
    }
}
