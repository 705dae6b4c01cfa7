//! Placeholder and dummy-guide generation for `/guide.xml`.
//!
//! Two distinct fallbacks exist: a full placeholder document built when no upstream XMLTV
//! URL is configured (or the remap pipeline fails on first fetch), and a per-channel
//! "dummy guide" appender that fills in channels the real feed left with no programmes, so
//! Plex never deactivates them for empty guide data.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::errors::{AppError, AppResult};
use crate::models::LiveChannel;

const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";
const DUMMY_SLOT_HOURS: i64 = 6;
const DUMMY_SLOT_COUNT: u32 = 28;

/// A full placeholder XMLTV document: one channel per local entry, each with a single
/// 24-hour programme titled after the channel's guide name. Used when there is no upstream
/// XMLTV feed configured, or the remap pipeline errors on the first fetch.
pub fn placeholder_guide(channels: &[LiveChannel], source_info_name: &str, now: DateTime<Utc>) -> AppResult<String> {
    let mut writer = Writer::new(Vec::new());

    let mut tv_start = BytesStart::new("tv");
    tv_start.push_attribute(("source-info-name", source_info_name));
    writer.write_event(Event::Start(tv_start)).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;

    for channel in channels {
        write_channel(&mut writer, channel)?;
    }

    let stop = now + ChronoDuration::hours(24);
    for channel in channels {
        write_programme(&mut writer, &channel.guide_number, &channel.guide_name, now, stop)?;
    }

    writer.write_event(Event::End(BytesEnd::new("tv"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    Ok(String::from_utf8(writer.into_inner()).expect("writer only emits UTF-8 text"))
}

/// Scan `xml` for channels with no `<programme channel="...">` entry at all, and append
/// 28 consecutive 6-hour placeholder programmes (titled after the channel's guide name) for
/// each, just before the closing `</tv>`.
pub fn inject_dummy_guide(xml: &str, channels: &[LiveChannel], now: DateTime<Utc>) -> AppResult<String> {
    let empty: Vec<&LiveChannel> = channels
        .iter()
        .filter(|c| !has_programme_for(xml, &c.guide_number))
        .collect();

    if empty.is_empty() {
        return Ok(xml.to_string());
    }

    let mut writer = Writer::new(Vec::new());
    for channel in &empty {
        let mut start = now;
        for _ in 0..DUMMY_SLOT_COUNT {
            let stop = start + ChronoDuration::hours(DUMMY_SLOT_HOURS);
            write_programme(&mut writer, &channel.guide_number, &channel.guide_name, start, stop)?;
            start = stop;
        }
    }
    let appended = String::from_utf8(writer.into_inner()).expect("writer only emits UTF-8 text");

    match xml.rfind("</tv>") {
        Some(pos) => {
            let mut out = String::with_capacity(xml.len() + appended.len());
            out.push_str(&xml[..pos]);
            out.push_str(&appended);
            out.push_str(&xml[pos..]);
            Ok(out)
        }
        None => Ok(xml.to_string()),
    }
}

fn has_programme_for(xml: &str, guide_number: &str) -> bool {
    let needle = format!(r#"channel="{guide_number}""#);
    xml.match_indices(&needle).any(|(idx, _)| {
        // Distinguish `<programme channel="N">` from `<channel id="N">` by checking the
        // nearest preceding tag name.
        xml[..idx].rfind('<').map(|tag_start| xml[tag_start..].starts_with("<programme")).unwrap_or(false)
    })
}

fn write_channel(writer: &mut Writer<Vec<u8>>, channel: &LiveChannel) -> AppResult<()> {
    let mut start = BytesStart::new("channel");
    start.push_attribute(("id", channel.guide_number.as_str()));
    writer.write_event(Event::Start(start)).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::Start(BytesStart::new("display-name"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::Text(BytesText::new(&channel.guide_name))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::End(BytesEnd::new("display-name"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::End(BytesEnd::new("channel"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    Ok(())
}

fn write_programme(
    writer: &mut Writer<Vec<u8>>,
    guide_number: &str,
    title: &str,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
) -> AppResult<()> {
    let start_str = start.format(XMLTV_TIME_FORMAT).to_string();
    let stop_str = stop.format(XMLTV_TIME_FORMAT).to_string();
    let mut programme = BytesStart::new("programme");
    programme.push_attribute(("channel", guide_number));
    programme.push_attribute(("start", start_str.as_str()));
    programme.push_attribute(("stop", stop_str.as_str()));
    writer.write_event(Event::Start(programme)).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::Start(BytesStart::new("title"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::Text(BytesText::new(title))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::End(BytesEnd::new("title"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    writer.write_event(Event::End(BytesEnd::new("programme"))).map_err(|e| AppError::xmltv(format!("XML write error: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn channel(number: &str, name: &str) -> LiveChannel {
        LiveChannel {
            channel_id: "x".to_string(),
            guide_number: number.to_string(),
            guide_name: name.to_string(),
            tvg_id: String::new(),
            epg_linked: false,
            group_title: String::new(),
            stream_url: String::new(),
            stream_urls: Vec::new(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn placeholder_guide_has_one_24h_programme_per_channel() {
        let channels = vec![channel("5", "CBC News")];
        let xml = placeholder_guide(&channels, "plex-tuner", fixed_now()).unwrap();
        assert!(xml.contains(r#"<channel id="5">"#));
        assert!(xml.contains("<title>CBC News</title>"));
        assert_eq!(xml.matches("<programme").count(), 1);
    }

    #[test]
    fn dummy_guide_skips_channels_with_real_programmes() {
        let xml = r#"<tv><channel id="5"><display-name>CBC</display-name></channel><programme channel="5" start="1" stop="2"><title>Real Show</title></programme></tv>"#;
        let channels = vec![channel("5", "CBC News")];
        let out = inject_dummy_guide(xml, &channels, fixed_now()).unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn dummy_guide_injects_28_slots_for_empty_channel() {
        let xml = r#"<tv><channel id="7"><display-name>Empty</display-name></channel></tv>"#;
        let channels = vec![channel("7", "Empty Channel")];
        let out = inject_dummy_guide(xml, &channels, fixed_now()).unwrap();
        assert_eq!(out.matches("<programme").count(), 28);
        assert!(out.contains("<title>Empty Channel</title>"));
        assert!(out.trim_end().ends_with("</tv>"));
    }
}
