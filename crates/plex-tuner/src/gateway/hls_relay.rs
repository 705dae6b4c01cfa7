//! Transport classification and HLS playlist line rewriting. The relay loop itself
//! (periodic re-fetch, segment seen-set, stall detection) lives in the web handler that
//! owns the client response stream; this module holds the pure, independently testable
//! pieces: classification and URL rewriting.

use url::Url;

/// A response is HLS when its `Content-Type` mentions `mpegurl`/`m3u`, or its URL ends in
/// `.m3u8` (some origins mislabel the content type).
pub fn is_hls(content_type: Option<&str>, url: &str) -> bool {
    let type_match = content_type
        .map(|ct| {
            let lower = ct.to_ascii_lowercase();
            lower.contains("mpegurl") || lower.contains("m3u")
        })
        .unwrap_or(false);
    type_match || url.ends_with(".m3u8")
}

/// Rewrite every non-comment line of an HLS playlist into an absolute URL resolved against
/// `base_url`. Scheme-relative lines (`//host/path`) are promoted using `base_url`'s scheme.
pub fn rewrite_playlist(playlist: &str, base_url: &Url) -> String {
    playlist
        .lines()
        .map(|line| rewrite_line(line, base_url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rewrite_line(line: &str, base_url: &Url) -> String {
    let trimmed = line.trim_end_matches('\r');
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return trimmed.to_string();
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return format!("{}://{}", base_url.scheme(), rest);
    }

    match base_url.join(trimmed) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// A nested `.m3u8` reference (master playlist pointing at a variant) triggers one level of
/// indirection; anything else (a `.ts`/`.aac`/etc segment) does not.
pub fn is_nested_playlist_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#') && trimmed.contains(".m3u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://origin.example.com/live/channel/index.m3u8").unwrap()
    }

    #[test]
    fn classifies_by_content_type() {
        assert!(is_hls(Some("application/vnd.apple.mpegurl"), "http://x/stream"));
        assert!(is_hls(Some("audio/x-mpegurl"), "http://x/stream"));
        assert!(!is_hls(Some("video/mp2t"), "http://x/stream"));
    }

    #[test]
    fn classifies_by_url_suffix_when_content_type_missing() {
        assert!(is_hls(None, "http://x/stream/index.m3u8"));
        assert!(!is_hls(None, "http://x/stream/index.ts"));
    }

    #[test]
    fn rewrites_relative_segment_urls_to_absolute() {
        let playlist = "#EXTM3U\n#EXTINF:10,\nseg1.ts\n#EXTINF:10,\nseg2.ts\n";
        let rewritten = rewrite_playlist(playlist, &base());
        assert!(rewritten.contains("https://origin.example.com/live/channel/seg1.ts"));
        assert!(rewritten.contains("https://origin.example.com/live/channel/seg2.ts"));
    }

    #[test]
    fn promotes_scheme_relative_lines() {
        let playlist = "#EXTM3U\n//cdn.example.com/seg1.ts\n";
        let rewritten = rewrite_playlist(playlist, &base());
        assert!(rewritten.contains("https://cdn.example.com/seg1.ts"));
    }

    #[test]
    fn comment_and_tag_lines_are_untouched() {
        let playlist = "#EXTM3U\n#EXT-X-VERSION:3\n";
        let rewritten = rewrite_playlist(playlist, &base());
        assert_eq!(rewritten, playlist.trim_end_matches('\n'));
    }

    #[test]
    fn nested_m3u8_line_is_detected() {
        assert!(is_nested_playlist_line("variant_720p.m3u8"));
        assert!(!is_nested_playlist_line("segment0001.ts"));
        assert!(!is_nested_playlist_line("#EXT-X-STREAM-INF:BANDWIDTH=800000"));
    }
}
