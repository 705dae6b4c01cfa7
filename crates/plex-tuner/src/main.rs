use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use plex_tuner::catalog::CatalogStore;
use plex_tuner::config::keywords::LineupKeywords;
use plex_tuner::config::Config;
use plex_tuner::hdhr::ssdp;
use plex_tuner::supervisor::{self, SupervisorConfig};
use plex_tuner::web::{self, AppState};

#[derive(Parser)]
#[command(name = "plex-tuner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HDHomeRun-compatible tuner emulator and live IPTV stream gateway for Plex")]
struct Cli {
    /// Configuration file path (TOML). Missing file falls back to compiled-in defaults.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address, overriding the config file.
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port, overriding the config file.
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Run as a supervisor that launches and restarts one or more tuner instances of this
    /// same binary, per the named JSON config, instead of serving directly.
    #[arg(long, value_name = "PATH")]
    supervise: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Some(supervisor_config_path) = cli.supervise.clone() {
        return run_supervisor(supervisor_config_path).await;
    }

    run_server(cli).await
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("plex_tuner={log_level},tower_http=info").into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_supervisor(config_path: PathBuf) -> Result<()> {
    let config = SupervisorConfig::load(&config_path).context("loading supervisor config")?;
    let tuner_binary = std::env::current_exe().context("resolving own binary path")?;
    let tuner_binary = tuner_binary.to_string_lossy().into_owned();

    info!(instances = config.instances.len(), "starting supervisor");
    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move { wait_for_shutdown_signal().await; shutdown_cancel.cancel(); });

    supervisor::run(&tuner_binary, config, cancel).await;
    info!("supervisor exiting");
    Ok(())
}

async fn run_server(cli: Cli) -> Result<()> {
    let mut config = Config::load(Some(&cli.config)).context("loading configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let keywords_path = config
        .lineup
        .keywords_path
        .clone()
        .unwrap_or_else(|| "lineup_keywords.toml".to_string());
    let keywords = LineupKeywords::load(std::path::Path::new(&keywords_path)).context("loading lineup keywords")?;

    let catalog = CatalogStore::load(config.catalog_path.clone(), &config.lineup, &keywords)
        .await
        .context("loading channel catalog")?;

    let addr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("parsing listen address")?;
    let base_url = config.effective_base_url();
    let device_id = config.device_id.clone();
    let ssdp_disabled = config.ssdp_disabled;

    let state = AppState::new(config, keywords, catalog).context("building application state")?;
    let router = web::build_router(state.clone());

    let cancel = CancellationToken::new();

    let mut tasks = Vec::new();
    if !ssdp_disabled {
        let ssdp_cancel = cancel.clone();
        tasks.push(tokio::spawn(async move { ssdp::run(&base_url, &device_id, ssdp_cancel).await }));
    }

    let refresh_cancel = cancel.clone();
    tasks.push(tokio::spawn(web::run_catalog_refresh_loop(state, refresh_cancel)));

    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move { wait_for_shutdown_signal().await; shutdown_cancel.cancel(); });

    info!(%addr, "plex-tuner starting");
    web::serve(addr, router, cancel).await?;

    for task in tasks {
        let _ = task.await;
    }
    info!("plex-tuner exited cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
