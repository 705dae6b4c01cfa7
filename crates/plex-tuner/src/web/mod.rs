//! HTTP surface: router assembly, shared application state, and the `AppError` → HTTP
//! response mapping. Thin handlers delegate to the `catalog`/`gateway`/`hdhr`/`lineup`/
//! `m3u`/`xmltv` modules for all actual behavior.

pub mod handlers;
pub mod responses;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::CatalogStore;
use crate::config::keywords::LineupKeywords;
use crate::config::Config;
use crate::errors::AppResult;
use crate::gateway::admission::TunerCounter;
use crate::utils::http_client::{HttpClientConfig, PooledHttpClient};
use crate::xmltv::XmltvCache;

/// Shared state handed to every axum handler via the `State` extractor. Cloning is cheap:
/// every field is either an `Arc`, an already-`Clone` pooled resource, or a plain value.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub keywords: Arc<LineupKeywords>,
    pub catalog: Arc<CatalogStore>,
    pub xmltv_cache: Arc<XmltvCache>,
    pub http_client: PooledHttpClient,
    pub tuner_counter: TunerCounter,
    pub started_at: Instant,
    pub last_refresh: Arc<RwLock<DateTime<Utc>>>,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config, keywords: LineupKeywords, catalog: CatalogStore) -> AppResult<Self> {
        let http_client = PooledHttpClient::new(HttpClientConfig::default())?;
        let tuner_counter = TunerCounter::new(config.effective_tuner_count());
        let xmltv_cache = XmltvCache::new(
            config.xmltv.clone(),
            http_client.clone(),
            config.xmltv.source_info_name.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            keywords: Arc::new(keywords),
            catalog: Arc::new(catalog),
            xmltv_cache: Arc::new(xmltv_cache),
            http_client,
            tuner_counter,
            started_at: Instant::now(),
            last_refresh: Arc::new(RwLock::new(Utc::now())),
            ready: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }
}

/// Periodically re-reads and re-shapes the catalog file so updates from an external
/// indexer are picked up without a restart. A zero interval disables the loop entirely.
pub async fn run_catalog_refresh_loop(state: AppState, cancel: CancellationToken) {
    let interval = state.config.catalog_refresh_interval;
    if interval.is_zero() {
        return;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // first tick fires immediately; the catalog is already freshly loaded

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                match state.catalog.reload(&state.config.lineup, &state.keywords).await {
                    Ok(count) => {
                        *state.last_refresh.write().await = Utc::now();
                        info!(channels = count, "catalog refreshed from disk");
                    }
                    Err(e) => tracing::warn!(error = %e, "background catalog refresh failed"),
                }
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/discover.json", get(handlers::discovery::discover_json))
        .route("/lineup.json", get(handlers::discovery::lineup_json))
        .route("/lineup_status.json", get(handlers::discovery::lineup_status_json))
        .route("/device.xml", get(handlers::discovery::device_xml))
        .route("/guide.xml", get(handlers::guide::guide_xml))
        .route("/live.m3u", get(handlers::playlist::live_m3u))
        .route("/stream/:key", get(handlers::stream::stream_handler))
        .route("/healthz", get(handlers::health::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on `addr` until `cancel` fires, then let in-flight requests drain.
pub async fn serve(addr: SocketAddr, router: Router, cancel: CancellationToken) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(crate::errors::AppError::Io)?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(crate::errors::AppError::Io)
}
