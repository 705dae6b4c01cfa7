//! Scheme whitelist enforced on every outbound fetch, so a catalog entry (or an XMLTV feed
//! supplying a stream URL) can't be used to reach non-HTTP schemes.

use crate::errors::{AppError, AppResult};

/// Reject any URL whose scheme is not `http` or `https`.
pub fn guard_scheme(url: &str) -> AppResult<()> {
    let parsed = url::Url::parse(url).map_err(|e| AppError::configuration(format!("invalid URL {url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::SchemeRejected { scheme: other.to_string() }),
    }
}

pub fn is_allowed_scheme(url: &str) -> bool {
    guard_scheme(url).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_pass() {
        assert!(is_allowed_scheme("http://example.com/stream.m3u8"));
        assert!(is_allowed_scheme("https://example.com/stream.m3u8"));
    }

    #[test]
    fn file_and_other_schemes_rejected() {
        assert!(!is_allowed_scheme("file:///etc/passwd"));
        assert!(!is_allowed_scheme("ftp://example.com/stream"));
    }

    #[test]
    fn malformed_url_rejected() {
        assert!(!is_allowed_scheme("not a url"));
    }
}
