//! Individual lineup filter predicates, applied in sequence by `shaper::shape`.

use regex::Regex;

use crate::config::keywords::LineupKeywords;
use crate::models::LiveChannel;

/// Step 1: drop anything that looks like a music/radio simulcast rather than a live-TV
/// channel, judged by substring heuristics on the guide name and TVG id.
pub fn is_music_or_radio(channel: &LiveChannel, keywords: &LineupKeywords) -> bool {
    let haystack = format!("{} {}", channel.guide_name, channel.tvg_id);
    keywords.is_music_or_radio(&haystack)
}

/// Step 2: conservative language filter. An empty `allow` list disables the filter. A
/// channel with no recognizable language token in its name defaults to allowed, on the
/// assumption that unlabeled channels are more often English than not.
pub fn passes_language_filter(channel: &LiveChannel, allow: &[String]) -> bool {
    if allow.is_empty() {
        return true;
    }
    let name = channel.guide_name.to_ascii_lowercase();
    allow.iter().any(|lang| {
        let token = lang.to_ascii_lowercase();
        name.contains(&format!("[{token}]")) || name.contains(&format!("({token})")) || !has_any_language_tag(&name)
    })
}

fn has_any_language_tag(name: &str) -> bool {
    name.contains('[') && name.contains(']') || name.contains('(') && name.contains(')')
}

/// Step 3: drop channels whose `GuideName + " " + TVGID` matches the configured exclude
/// regex.
pub fn passes_exclude_regex(channel: &LiveChannel, pattern: Option<&Regex>) -> bool {
    match pattern {
        None => true,
        Some(re) => {
            let haystack = format!("{} {}", channel.guide_name, channel.tvg_id);
            !re.is_match(&haystack)
        }
    }
}

/// Step 4: coarse category filter. `None` disables the filter; otherwise a channel must
/// classify into the requested category to survive.
pub fn passes_category_filter(channel: &LiveChannel, category: Option<&str>, keywords: &LineupKeywords) -> bool {
    match category {
        None => true,
        Some(wanted) => {
            let haystack = format!("{} {} {}", channel.guide_name, channel.tvg_id, channel.group_title);
            keywords.category_for(&haystack) == Some(wanted)
        }
    }
}

pub fn compile_exclude_regex(pattern: &Option<String>) -> crate::errors::AppResult<Option<Regex>> {
    match pattern {
        None => Ok(None),
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|e| crate::errors::AppError::configuration(format!("invalid exclude_regex: {e}"))),
    }
}
