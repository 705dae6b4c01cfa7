//! `UpdateChannels`: the full lineup shaping pipeline run whenever the catalog is (re)loaded.

use tracing::debug;

use super::{filters, offset, scoring};
use crate::config::keywords::LineupKeywords;
use crate::config::LineupConfig;
use crate::models::LiveChannel;

/// Run the six pre-cap shaping steps, then cap to the wizard-safe limit, then apply the
/// guide-number offset. Returns a fresh `Vec`; never mutates `raw`.
pub fn shape(raw: Vec<LiveChannel>, config: &LineupConfig, keywords: &LineupKeywords) -> Vec<LiveChannel> {
    let exclude_re = filters::compile_exclude_regex(&config.exclude_regex)
        .unwrap_or_else(|e| {
            debug!(error = %e, "ignoring invalid exclude_regex");
            None
        });

    let mut shaped: Vec<LiveChannel> = raw
        .into_iter()
        .filter(|c| !config.drop_music_radio || !filters::is_music_or_radio(c, keywords))
        .filter(|c| filters::passes_language_filter(c, &config.language_allow))
        .filter(|c| filters::passes_exclude_regex(c, exclude_re.as_ref()))
        .filter(|c| filters::passes_category_filter(c, config.category_filter.as_deref(), keywords))
        .collect();

    if config.epg_prune {
        shaped.retain(|c| !c.tvg_id.is_empty());
    }

    shaped.sort_by_key(|c| std::cmp::Reverse(scoring::affinity_score(c, &config.region_profile, keywords)));

    let shaped = shard(shaped, config.shard_skip, config.shard_take);
    let capped = cap_to_wizard_limit(shaped, effective_max_channels(config));
    offset::apply_offset(&capped, config.guide_number_offset)
}

fn shard(channels: Vec<LiveChannel>, skip: usize, take: Option<usize>) -> Vec<LiveChannel> {
    let iter = channels.into_iter().skip(skip);
    match take {
        Some(n) => iter.take(n).collect(),
        None => iter.collect(),
    }
}

fn cap_to_wizard_limit(mut channels: Vec<LiveChannel>, max_channels: i64) -> Vec<LiveChannel> {
    if max_channels < 0 {
        return channels;
    }
    let max_channels = max_channels as usize;
    if channels.len() > max_channels {
        channels.truncate(max_channels);
    }
    channels
}

fn effective_max_channels(config: &LineupConfig) -> i64 {
    if config.easy_mode && config.max_channels == crate::config::defaults::default_max_channels() {
        479
    } else {
        config.max_channels
    }
}
