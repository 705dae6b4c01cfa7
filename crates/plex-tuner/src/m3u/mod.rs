//! `/live.m3u`: the extended M3U playlist Plex (or any M3U-speaking client) can load
//! directly, pointing `url-tvg` at `/guide.xml` and each channel at its `/stream/<id>` URL.

use crate::models::LiveChannel;

/// Build the full `#EXTM3U` playlist body for `channels`. When EPG pruning left channels
/// with an empty `TVGID` in the snapshot, they are skipped here too, but the *original*
/// index (before skipping) is still what backs the numeric stream-id fallback, matching the
/// HDHR lineup's index semantics.
pub fn build_playlist(channels: &[LiveChannel], base_url: &str, epg_prune: bool) -> String {
    let mut out = format!("#EXTM3U url-tvg=\"{base_url}/guide.xml\"\n");

    for (index, channel) in channels.iter().enumerate() {
        if epg_prune && channel.tvg_id.is_empty() {
            continue;
        }

        let tvg_id = if !channel.tvg_id.is_empty() { channel.tvg_id.as_str() } else { channel.guide_number.as_str() };
        let stream_id = if !channel.channel_id.is_empty() {
            channel.channel_id.clone()
        } else if !channel.guide_number.is_empty() {
            channel.guide_number.clone()
        } else {
            index.to_string()
        };
        let tvg_name = urlencoding::encode(&channel.guide_name);

        out.push_str(&format!(
            "#EXTINF:-1 tvg-id=\"{tvg_id}\" tvg-name=\"{tvg_name}\",{name}\n{base_url}/stream/{stream_id}\n",
            name = channel.guide_name,
        ));
    }

    out
}
