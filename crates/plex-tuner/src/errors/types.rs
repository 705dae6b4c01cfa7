//! Error type definitions for the tuner core.

use thiserror::Error;

/// Top-level application error type.
///
/// Every module boundary in the core funnels its failures through this enum so the web
/// layer has a single place to map errors onto HTTP statuses (see `IntoResponse` in
/// `crate::web::responses`).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("catalog error: {message}")]
    Catalog { message: String },

    #[error("channel not found: {key}")]
    ChannelNotFound { key: String },

    #[error("all tuners in use (limit={limit})")]
    TunersInUse { limit: u32 },

    #[error("upstream scheme not allowed: {scheme}")]
    SchemeRejected { scheme: String },

    #[error("all upstreams failed for channel {channel_id}")]
    AllUpstreamsFailed { channel_id: String },

    #[error("ffmpeg error: {message}")]
    Ffmpeg { message: String },

    #[error("xmltv error: {message}")]
    Xmltv { message: String },

    #[error("supervisor error: {message}")]
    Supervisor { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog { message: message.into() }
    }

    pub fn ffmpeg(message: impl Into<String>) -> Self {
        Self::Ffmpeg { message: message.into() }
    }

    pub fn xmltv(message: impl Into<String>) -> Self {
        Self::Xmltv { message: message.into() }
    }

    pub fn supervisor(message: impl Into<String>) -> Self {
        Self::Supervisor { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}
