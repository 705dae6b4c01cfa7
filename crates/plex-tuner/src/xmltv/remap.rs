//! XMLTV remap: streaming rewrite of an upstream XMLTV document to the locally
//! exposed lineup, following the same quick-xml streaming-parser discipline used elsewhere
//! in the project rather than a full-document DOM deserialization.

use std::collections::{HashMap, HashSet};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::normalize::{self, NormalizeConfig, TextCandidate};
use crate::errors::{AppError, AppResult};
use crate::models::LiveChannel;

const TEXT_TAGS: &[&str] = &["title", "sub-title", "desc"];

/// Scan `xml` for every upstream `<channel id="...">`/`<channel id="..."/>` id, ignoring
/// everything else, so the kept-channel set can be decided before the main rewrite pass
/// without buffering the whole document.
fn collect_upstream_channel_ids(xml: &str) -> HashSet<String> {
    let mut ids = HashSet::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    loop {
        let event = match reader.read_event() {
            Ok(e) => e,
            Err(_) => break,
        };
        match event {
            Event::Eof => break,
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"channel" => {
                if let Some(id) = e.attributes().flatten().find(|a| a.key.as_ref() == b"id") {
                    ids.insert(String::from_utf8_lossy(&id.value).into_owned());
                }
            }
            _ => {}
        }
    }

    ids
}

/// Map from upstream `tvg-id` to the local lineup entry it matches, restricted to ids the
/// upstream document itself declares via `<channel id=…>` — a local channel whose `TVGID`
/// the upstream feed never lists is not "kept", even if it happens to share that id.
fn build_tvg_index<'a>(channels: &'a [LiveChannel], upstream_ids: &HashSet<String>) -> HashMap<&'a str, &'a LiveChannel> {
    channels
        .iter()
        .filter(|c| !c.tvg_id.is_empty() && upstream_ids.contains(&c.tvg_id))
        .map(|c| (c.tvg_id.as_str(), c))
        .collect()
}

/// Rewrite `upstream_xml` to only the channels it itself declares (via `<channel id=…>`)
/// that also match a local `TVGID`, with every `<programme channel=…>` remapped to the
/// local `GuideNumber`.
pub fn remap(upstream_xml: &str, channels: &[LiveChannel], source_info_name: &str, normalize_cfg: &NormalizeConfig) -> AppResult<String> {
    let upstream_ids = collect_upstream_channel_ids(upstream_xml);
    let tvg_index = build_tvg_index(channels, &upstream_ids);

    let mut sorted_channels: Vec<&LiveChannel> = tvg_index.values().copied().collect();
    sorted_channels.sort_by(|a, b| {
        a.guide_number
            .parse::<f64>()
            .partial_cmp(&b.guide_number.parse::<f64>().unwrap_or(f64::MAX))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.guide_name.cmp(&b.guide_name))
    });

    let mut writer = Writer::new(Vec::new());
    write_root_and_channels(&mut writer, source_info_name, &sorted_channels)?;

    let mut reader = Reader::from_str(upstream_xml);
    reader.config_mut().trim_text(false);

    let mut seen_root = false;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::xmltv(format!("XML parse error: {e}")))?;

        match event {
            Event::Eof => break,
            Event::Start(ref e) if e.name().as_ref() == b"tv" => {
                seen_root = true;
            }
            Event::Start(ref e) if e.name().as_ref() == b"channel" => {
                skip_subtree(&mut reader, b"channel")?;
            }
            Event::Empty(ref e) if e.name().as_ref() == b"channel" => {
                // self-closing <channel/>, nothing to skip
            }
            Event::Start(ref e) if e.name().as_ref() == b"programme" => {
                if !seen_root {
                    continue;
                }
                rewrite_programme(&mut reader, e, &tvg_index, normalize_cfg, &mut writer)?;
            }
            _ => {
                // outside <tv>...</tv> scaffolding (xml decl, DOCTYPE, whitespace) is dropped
            }
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("tv")))
        .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| AppError::xmltv(format!("non-UTF8 output: {e}")))
}

fn write_root_and_channels(
    writer: &mut Writer<Vec<u8>>,
    source_info_name: &str,
    channels: &[&LiveChannel],
) -> AppResult<()> {
    let mut tv_start = BytesStart::new("tv");
    tv_start.push_attribute(("source-info-name", source_info_name));
    writer
        .write_event(Event::Start(tv_start))
        .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

    for channel in channels {
        let mut channel_start = BytesStart::new("channel");
        channel_start.push_attribute(("id", channel.guide_number.as_str()));
        writer
            .write_event(Event::Start(channel_start))
            .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

        writer
            .write_event(Event::Start(BytesStart::new("display-name")))
            .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
        writer
            .write_event(Event::Text(BytesText::new(&channel.guide_name)))
            .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
        writer
            .write_event(Event::End(BytesEnd::new("display-name")))
            .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

        writer
            .write_event(Event::End(BytesEnd::new("channel")))
            .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    }

    Ok(())
}

/// Skip all events up to and including the matching end tag for `tag_name`, accounting for
/// nested elements of the same name.
fn skip_subtree(reader: &mut Reader<&[u8]>, tag_name: &[u8]) -> AppResult<()> {
    let mut depth = 1;
    loop {
        match reader.read_event().map_err(|e| AppError::xmltv(format!("XML parse error: {e}")))? {
            Event::Start(ref e) if e.name().as_ref() == tag_name => depth += 1,
            Event::End(ref e) if e.name().as_ref() == tag_name => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

fn rewrite_programme(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    tvg_index: &HashMap<&str, &LiveChannel>,
    normalize_cfg: &NormalizeConfig,
    writer: &mut Writer<Vec<u8>>,
) -> AppResult<()> {
    let mut channel_attr = None;
    let mut other_attrs: Vec<(String, String)> = Vec::new();
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        if key == "channel" {
            channel_attr = Some(value);
        } else {
            other_attrs.push((key, value));
        }
    }

    let Some(matched) = channel_attr.as_deref().and_then(|id| tvg_index.get(id)) else {
        // No local channel matches this upstream tvg-id: drop the whole programme.
        skip_subtree(reader, b"programme")?;
        return Ok(());
    };

    // Collect children verbatim, grouping the text-normalized tags.
    let mut grouped: HashMap<&'static str, Vec<TextCandidate>> = HashMap::new();
    let mut passthrough: Vec<Event<'static>> = Vec::new();
    let mut current_text_tag: Option<&'static str> = None;
    let mut current_lang: Option<String> = None;
    let mut current_text = String::new();

    loop {
        match reader.read_event().map_err(|e| AppError::xmltv(format!("XML parse error: {e}")))? {
            Event::End(ref e) if e.name().as_ref() == b"programme" => break,
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(tag) = TEXT_TAGS.iter().find(|t| **t == name) {
                    current_text_tag = Some(tag);
                    current_lang = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"lang")
                        .map(|a| String::from_utf8_lossy(&a.value).to_string());
                    current_text.clear();
                } else {
                    passthrough.push(Event::Start(e.clone().into_owned()));
                }
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(&e).to_string();
                if current_text_tag.is_some() {
                    current_text.push_str(&text);
                } else {
                    passthrough.push(Event::Text(BytesText::new(&text).into_owned()));
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(tag) = current_text_tag.take() {
                    if TEXT_TAGS.contains(&name.as_str()) {
                        grouped.entry(tag).or_default().push(TextCandidate {
                            lang: current_lang.take(),
                            text: current_text.clone(),
                        });
                        current_text.clear();
                        continue;
                    }
                }
                passthrough.push(Event::End(e.clone().into_owned()));
            }
            Event::Empty(ref e) => {
                passthrough.push(Event::Empty(e.clone().into_owned()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut new_start = BytesStart::new("programme");
    new_start.push_attribute(("channel", matched.guide_number.as_str()));
    for (key, value) in &other_attrs {
        new_start.push_attribute((key.as_str(), value.as_str()));
    }
    writer
        .write_event(Event::Start(new_start))
        .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

    for tag in TEXT_TAGS {
        if let Some(candidates) = grouped.get(*tag) {
            if let Some(chosen) = normalize::pick_preferred(candidates, normalize_cfg) {
                let text = if *tag == "title" {
                    normalize::resolve_title(&chosen.text, &matched.guide_name, normalize_cfg.latin_preference)
                } else {
                    chosen.text.clone()
                };
                writer
                    .write_event(Event::Start(BytesStart::new(*tag)))
                    .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
                writer
                    .write_event(Event::End(BytesEnd::new(*tag)))
                    .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
            }
        }
    }

    for event in passthrough {
        writer
            .write_event(event)
            .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("programme")))
        .map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(tvg_id: &str, number: &str, name: &str) -> LiveChannel {
        LiveChannel {
            channel_id: "x".to_string(),
            guide_number: number.to_string(),
            guide_name: name.to_string(),
            tvg_id: tvg_id.to_string(),
            epg_linked: true,
            group_title: String::new(),
            stream_url: String::new(),
            stream_urls: Vec::new(),
        }
    }

    fn config() -> NormalizeConfig {
        NormalizeConfig { preferred_languages: vec!["en".to_string()], latin_preference: true }
    }

    #[test]
    fn drops_channel_and_programmes_when_upstream_never_declares_the_tvg_id() {
        let xml = r#"<tv><channel id="upstream.1"><display-name>Upstream</display-name></channel>
<programme channel="unknown.id" start="20260101000000"><title>Show</title></programme>
</tv>"#;
        let channels = vec![channel("cbc.ca", "5", "CBC")];
        let out = remap(xml, &channels, "plex-tuner", &config()).unwrap();
        assert!(!out.contains("<programme"));
        assert!(!out.contains("<channel"));
    }

    #[test]
    fn rewrites_matching_programme_channel_attribute() {
        let xml = r#"<tv><channel id="cbc.ca"><display-name>CBC</display-name></channel>
<programme channel="cbc.ca" start="20260101000000" stop="20260101010000"><title>News</title></programme></tv>"#;
        let channels = vec![channel("cbc.ca", "5", "CBC News")];
        let out = remap(xml, &channels, "plex-tuner", &config()).unwrap();
        assert!(out.contains(r#"<channel id="5">"#));
        assert!(out.contains(r#"channel="5""#));
        assert!(out.contains(r#"start="20260101000000""#));
        assert!(out.contains("<title>News</title>"));
    }

    #[test]
    fn picks_preferred_language_title() {
        let xml = r#"<tv><channel id="cbc.ca"/><programme channel="cbc.ca" start="1"><title lang="fr">Les Nouvelles</title><title lang="en">The News</title></programme></tv>"#;
        let channels = vec![channel("cbc.ca", "5", "CBC News")];
        let out = remap(xml, &channels, "plex-tuner", &config()).unwrap();
        assert!(out.contains("The News"));
        assert!(!out.contains("Les Nouvelles"));
    }

    #[test]
    fn local_channels_sorted_by_guide_number() {
        let xml = r#"<tv><channel id="b.id"/><channel id="a.id"/></tv>"#;
        let channels = vec![channel("b.id", "10", "B"), channel("a.id", "2", "A")];
        let out = remap(xml, &channels, "plex-tuner", &config()).unwrap();
        let pos_2 = out.find(r#"id="2""#).unwrap();
        let pos_10 = out.find(r#"id="10""#).unwrap();
        assert!(pos_2 < pos_10);
    }

    #[test]
    fn keeps_only_channels_the_upstream_document_itself_declares() {
        let xml = r#"<tv><channel id="a.id"/></tv>"#;
        let channels = vec![channel("a.id", "2", "A"), channel("b.id", "10", "B")];
        let out = remap(xml, &channels, "plex-tuner", &config()).unwrap();
        assert!(out.contains(r#"<channel id="2">"#));
        assert!(!out.contains(r#"<channel id="10">"#));
        assert_eq!(out.matches("<channel").count(), 1);
    }
}
