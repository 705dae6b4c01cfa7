//! Step 7 of `UpdateChannels`: the guide-number offset applied after capping, so each
//! supervised child tuner can be given a disjoint channel-number range.

use crate::models::LiveChannel;

/// Add `offset` to every channel whose `GuideNumber` parses as an integer; channels with a
/// non-numeric `GuideNumber` (e.g. `"5.1"` sub-channels are left as strings here and handled
/// by the integer-parse fallthrough) are returned unchanged. Produces a fresh `Vec`; the
/// input is never mutated in place.
pub fn apply_offset(channels: &[LiveChannel], offset: i64) -> Vec<LiveChannel> {
    if offset == 0 {
        return channels.to_vec();
    }
    channels
        .iter()
        .map(|c| {
            let mut shifted = c.clone();
            if let Ok(n) = c.guide_number.parse::<i64>() {
                shifted.guide_number = (n + offset).to_string();
            }
            shifted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(number: &str) -> LiveChannel {
        LiveChannel {
            channel_id: "x".to_string(),
            guide_number: number.to_string(),
            guide_name: "Test".to_string(),
            tvg_id: String::new(),
            epg_linked: false,
            group_title: String::new(),
            stream_url: String::new(),
            stream_urls: Vec::new(),
        }
    }

    #[test]
    fn numeric_guide_numbers_are_shifted() {
        let channels = vec![channel("5"), channel("12")];
        let shifted = apply_offset(&channels, 100);
        assert_eq!(shifted[0].guide_number, "105");
        assert_eq!(shifted[1].guide_number, "112");
    }

    #[test]
    fn non_numeric_guide_numbers_are_left_alone() {
        let channels = vec![channel("5.1")];
        let shifted = apply_offset(&channels, 100);
        assert_eq!(shifted[0].guide_number, "5.1");
    }

    #[test]
    fn zero_offset_is_a_plain_copy() {
        let channels = vec![channel("5"), channel("5.1")];
        let shifted = apply_offset(&channels, 0);
        assert_eq!(shifted, channels);
    }

    #[test]
    fn input_slice_is_not_mutated() {
        let channels = vec![channel("5")];
        let _ = apply_offset(&channels, 100);
        assert_eq!(channels[0].guide_number, "5");
    }
}
