//! Step 5 of the lineup shaping pipeline: the North-America-English affinity score used to
//! stable-sort the wizard-facing channel order.

use crate::config::keywords::LineupKeywords;
use crate::models::LiveChannel;

/// Higher is more likely to be wanted first. Boosts regional TLD/city/network hits for the
/// configured region profile, penalizes shopping/adult/PPV terms, and lightly prefers low
/// channel numbers as a stable tiebreaker.
pub fn affinity_score(channel: &LiveChannel, region_profile: &str, keywords: &LineupKeywords) -> i64 {
    let haystack = format!(
        "{} {} {}",
        channel.guide_name.to_ascii_lowercase(),
        channel.tvg_id.to_ascii_lowercase(),
        channel.group_title.to_ascii_lowercase()
    )
    .to_ascii_lowercase();

    let mut score: i64 = 0;

    if let Some(region) = keywords.region(region_profile) {
        if region.tlds.iter().any(|tld| tvg_id_has_tld(&channel.tvg_id, tld)) {
            score += 30;
        }
        if region.cities.iter().any(|c| haystack.contains(c.as_str())) {
            score += 15;
        }
        if region.networks.iter().any(|n| haystack.contains(n.as_str())) {
            score += 20;
        }
    }

    for term in &keywords.penalty_terms {
        if haystack.contains(term.as_str()) {
            score -= 50;
        }
    }

    if !is_mostly_latin(&channel.guide_name) {
        score -= 25;
    }

    // Lightly prefer low channel numbers as a tiebreaker; capped so it never dominates the
    // content-based signals above.
    if let Ok(n) = channel.guide_number.parse::<i64>() {
        score -= (n / 100).min(5);
    }

    score
}

fn tvg_id_has_tld(tvg_id: &str, tld: &str) -> bool {
    tvg_id
        .rsplit('.')
        .next()
        .map(|suffix| suffix.eq_ignore_ascii_case(tld))
        .unwrap_or(false)
}

fn is_mostly_latin(name: &str) -> bool {
    let total = name.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return true;
    }
    let latin = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_punctuation())
        .count();
    latin * 2 >= total
}
