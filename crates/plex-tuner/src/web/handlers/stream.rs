//! `/stream/<key>`: admits a tuner slot, resolves the channel and a live upstream URL, then
//! relays bytes to the client either directly, through the built-in HLS relay loop, or
//! through the ffmpeg remux/transcode pipeline (startup gate + PAT/PMT keepalive +
//! continuous stdout forwarding).

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};
use tracing::{debug, warn};
use url::Url;

use crate::errors::{AppError, AppResult};
use crate::gateway::admission::TunerGuard;
use crate::gateway::adaptive_writer::{AdaptiveState, BufferPolicy};
use crate::gateway::ffmpeg::startup_gate::{StartupGate, StartupGateConfig};
use crate::gateway::ffmpeg::{keepalive, probe, resolve_host_numeric, FfmpegCommandBuilder, FfmpegProcess};
use crate::gateway::hls_relay;
use crate::gateway::url_select::{select_upstream, SelectedUpstream};
use crate::web::AppState;

const SEGMENT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const SEEN_SEGMENTS_CAP: usize = 4096;

pub async fn stream_handler(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<Response> {
    let guard = state.tuner_counter.acquire().await?;
    let channel = state.catalog.find(&key).ok_or_else(|| AppError::ChannelNotFound { key: key.clone() })?;

    let auth = match (&state.config.stream.provider_user, &state.config.stream.provider_pass) {
        (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
        _ => None,
    };
    let auth_ref = auth.as_ref().map(|(u, p)| (u.as_str(), p.as_str()));

    let selected = select_upstream(&channel, &state.http_client, auth_ref).await?;
    let content_type = selected
        .response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if hls_relay::is_hls(content_type.as_deref(), &selected.url) {
        debug!(channel = %key, url = %selected.url, "relaying HLS upstream");
        stream_via_ffmpeg_for_hls_or_relay(state, selected.url, auth, guard).await
    } else {
        debug!(channel = %key, url = %selected.url, "relaying transport-stream upstream");
        stream_via_ffmpeg_or_passthrough(state, selected, content_type, guard).await
    }
}

async fn stream_via_ffmpeg_or_passthrough(
    state: AppState,
    selected: SelectedUpstream,
    content_type: Option<String>,
    guard: TunerGuard,
) -> AppResult<Response> {
    let stream_cfg = state.config.stream.clone();
    let mode = probe::resolve_mode(stream_cfg.transcode_mode, &stream_cfg.ffprobe_path, &selected.url).await;
    let args = FfmpegCommandBuilder::build_args(mode, &selected.url, stream_cfg.ffmpeg_hls_reconnect);

    match FfmpegProcess::spawn(&stream_cfg.ffmpeg_path, &args) {
        Ok(process) => spawn_ffmpeg_pipeline(process, stream_cfg, guard),
        Err(e) => {
            warn!(error = %e, "ffmpeg unavailable, falling back to direct upstream passthrough");
            passthrough_response(selected, content_type, guard)
        }
    }
}

fn passthrough_response(selected: SelectedUpstream, content_type: Option<String>, guard: TunerGuard) -> AppResult<Response> {
    let body_stream = selected.response.bytes_stream().map(move |item| {
        let _keep_admitted = &guard;
        item
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.unwrap_or_else(|| "video/mp2t".to_string()))
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::internal(e.to_string()))
}

/// Bounded so `tx.send(...).await` actually observes client backpressure: it only returns
/// once the HTTP body stream has pulled a slot free, which is what the adaptive writer's
/// flush-timing measurement is meant to react to.
const FORWARDING_CHANNEL_CAPACITY: usize = 2;

fn spawn_ffmpeg_pipeline(
    mut process: FfmpegProcess,
    stream_cfg: crate::config::StreamConfig,
    guard: TunerGuard,
) -> AppResult<Response> {
    let mut stdout = process
        .take_stdout()
        .ok_or_else(|| AppError::ffmpeg("ffmpeg stdout was not piped"))?;

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(FORWARDING_CHANNEL_CAPACITY);
    let stop_flag = Arc::new(AtomicBool::new(false));

    let keepalive_tx = tx.clone();
    let keepalive_stop = stop_flag.clone();
    let keepalive_interval = stream_cfg.keepalive_interval;
    tokio::spawn(async move {
        let (ticks, stop) = keepalive::run(
            keepalive_interval,
            move |packet| keepalive_tx.try_send(Ok(Bytes::copy_from_slice(&packet))).is_ok(),
            move || keepalive_stop.load(Ordering::Relaxed),
        )
        .await;
        keepalive::log_stop(ticks, &stop);
    });

    let gate_cfg = StartupGateConfig {
        bytes_budget: stream_cfg.startup_gate_bytes_budget,
        timeout: stream_cfg.startup_gate_timeout,
        require_good_start: stream_cfg.require_good_start,
    };
    let buffer_policy = BufferPolicy::from_config_value(stream_cfg.buffer_bytes);

    tokio::spawn(async move {
        // Keep the ffmpeg child and the tuner admission slot alive for the task's lifetime.
        let _process = process;
        let _guard = guard;

        let mut gate = StartupGate::new(gate_cfg);
        let mut gate_released = false;
        let mut buf = vec![0u8; 64 * 1024];
        let mut adaptive = AdaptiveState::default();
        let mut pending: Vec<u8> = Vec::new();
        let mut flush_started = Instant::now();

        loop {
            let n = match stdout.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            };

            if gate_released {
                pending.extend_from_slice(&buf[..n]);
                let should_flush = match buffer_policy {
                    BufferPolicy::PassThrough => true,
                    BufferPolicy::Fixed(target) => pending.len() >= target,
                    BufferPolicy::Adaptive => pending.len() >= adaptive.target_bytes(),
                };
                if should_flush && flush_pending(&tx, &mut pending).await.is_err() {
                    break;
                }
                if should_flush && matches!(buffer_policy, BufferPolicy::Adaptive) {
                    adaptive.record_flush(flush_started.elapsed());
                    flush_started = Instant::now();
                }
                continue;
            }

            if gate.accumulate(&buf[..n]) {
                stop_flag.store(true, Ordering::Relaxed);
                match gate.finish() {
                    Ok(result) => {
                        debug!(
                            bytes = result.buffered.len(),
                            idr_seen = result.idr_seen,
                            aac_seen = result.aac_seen,
                            "startup gate released"
                        );
                        if tx.send(Ok(Bytes::from(result.buffered))).await.is_err() {
                            break;
                        }
                        gate_released = true;
                        flush_started = Instant::now();
                    }
                    Err(e) => {
                        let _ = tx.send(Err(io::Error::new(io::ErrorKind::Other, e.to_string()))).await;
                        break;
                    }
                }
            }
        }

        let _ = flush_pending(&tx, &mut pending).await;
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp2t")
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .map_err(|e| AppError::internal(e.to_string()))
}

/// Send any buffered bytes downstream and clear the buffer. A no-op when `pending` is empty
/// (e.g. at end-of-stream with nothing left to drain).
async fn flush_pending(tx: &mpsc::Sender<io::Result<Bytes>>, pending: &mut Vec<u8>) -> Result<(), ()> {
    if pending.is_empty() {
        return Ok(());
    }
    let chunk = Bytes::from(std::mem::take(pending));
    tx.send(Ok(chunk)).await.map_err(|_| ())
}

/// HLS upstream entry point: if `ffmpeg` is on `PATH`, let it demux the playlist directly
/// (its stdout goes through the same startup-gate + keepalive pipeline as a direct
/// transport-stream upstream); otherwise fall back to the built-in playlist-follow relay.
async fn stream_via_ffmpeg_for_hls_or_relay(
    state: AppState,
    playlist_url: String,
    auth: Option<(String, String)>,
    guard: TunerGuard,
) -> AppResult<Response> {
    let stream_cfg = state.config.stream.clone();
    let numeric_url = resolve_host_numeric(&playlist_url).await;
    let mode = probe::resolve_mode(stream_cfg.transcode_mode, &stream_cfg.ffprobe_path, &numeric_url).await;
    let args = FfmpegCommandBuilder::build_args(mode, &numeric_url, stream_cfg.ffmpeg_hls_reconnect);

    match FfmpegProcess::spawn(&stream_cfg.ffmpeg_path, &args) {
        Ok(process) => spawn_ffmpeg_pipeline(process, stream_cfg, guard),
        Err(e) => {
            warn!(error = %e, "ffmpeg unavailable for HLS input, falling back to built-in HLS relay");
            stream_via_hls_relay(state, playlist_url, auth, guard).await
        }
    }
}

async fn stream_via_hls_relay(state: AppState, playlist_url: String, auth: Option<(String, String)>, guard: TunerGuard) -> AppResult<Response> {
    let (tx, rx) = mpsc::unbounded_channel::<io::Result<Bytes>>();
    let stall_timeout = state.config.stream.hls_stall_timeout;
    let client = state.http_client.clone();

    tokio::spawn(async move {
        let _guard = guard;
        run_hls_relay_loop(client, playlist_url, auth, stall_timeout, tx).await;
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp2t")
        .body(Body::from_stream(UnboundedReceiverStream::new(rx)))
        .map_err(|e| AppError::internal(e.to_string()))
}

/// Poll the HLS media playlist, fetch each newly listed segment in order, and forward its
/// bytes to `tx`. Follows one level of master → variant indirection on the first fetch.
/// Gives up once `stall_timeout` passes with no new segment appearing.
async fn run_hls_relay_loop(
    client: crate::utils::http_client::PooledHttpClient,
    mut playlist_url: String,
    auth: Option<(String, String)>,
    stall_timeout: Duration,
    tx: mpsc::UnboundedSender<io::Result<Bytes>>,
) {
    let mut seen = HashSet::new();
    let mut last_new_at = Instant::now();
    let mut followed_variant = false;

    loop {
        let auth_ref = auth.as_ref().map(|(u, p)| (u.as_str(), p.as_str()));
        let body = match client.get_with_retry(&playlist_url, auth_ref).await {
            Ok(response) => match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to read HLS playlist body");
                    tokio::time::sleep(SEGMENT_POLL_INTERVAL).await;
                    continue;
                }
            },
            Err(e) => {
                warn!(error = %e, url = %playlist_url, "failed to fetch HLS playlist");
                tokio::time::sleep(SEGMENT_POLL_INTERVAL).await;
                continue;
            }
        };

        let base = match Url::parse(&playlist_url) {
            Ok(url) => url,
            Err(e) => {
                let _ = tx.send(Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string())));
                return;
            }
        };

        if !followed_variant {
            followed_variant = true;
            if let Some(nested) = body.lines().find(|line| hls_relay::is_nested_playlist_line(line)) {
                if let Ok(resolved) = base.join(nested.trim()) {
                    playlist_url = resolved.to_string();
                    continue;
                }
            }
        }

        let rewritten = hls_relay::rewrite_playlist(&body, &base);
        let segment_urls: Vec<String> = rewritten
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        let mut saw_new_segment = false;
        for segment_url in &segment_urls {
            if seen.contains(segment_url) {
                continue;
            }
            saw_new_segment = true;
            seen.insert(segment_url.clone());
            last_new_at = Instant::now();

            let auth_ref = auth.as_ref().map(|(u, p)| (u.as_str(), p.as_str()));
            let fetched = match client.get_with_retry(segment_url, auth_ref).await {
                Ok(response) => response.bytes().await,
                Err(e) => {
                    warn!(error = %e, segment_url, "skipping HLS segment: fetch failed");
                    continue;
                }
            };

            match fetched {
                Ok(bytes) => {
                    if tx.send(Ok(bytes)).is_err() {
                        debug!("client disconnected, stopping HLS relay");
                        return;
                    }
                }
                Err(e) => warn!(error = %e, segment_url, "skipping HLS segment: body read failed"),
            }
        }

        if !saw_new_segment && last_new_at.elapsed() >= stall_timeout {
            warn!(?stall_timeout, "HLS relay stalled: no new segments within timeout");
            let _ = tx.send(Err(io::Error::new(io::ErrorKind::TimedOut, "upstream HLS playlist stalled")));
            return;
        }

        if seen.len() > SEEN_SEGMENTS_CAP {
            seen.clear();
        }

        tokio::time::sleep(SEGMENT_POLL_INTERVAL).await;
    }
}
