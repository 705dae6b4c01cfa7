//! Per-language/script text normalization applied to repeated `<title>`/`<sub-title>`/
//! `<desc>` text nodes during the XMLTV remap.

/// One candidate text node for a given tag (e.g. all the `<title lang="...">` siblings
/// under one `<programme>`).
#[derive(Debug, Clone)]
pub struct TextCandidate {
    pub lang: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub preferred_languages: Vec<String>,
    pub latin_preference: bool,
}

/// Pick one candidate among several same-tag text nodes with distinct `lang=` attributes:
/// first match in the configured preferred-language list; otherwise, if Latin preference is
/// set, the first candidate whose text is more than half Latin letters (with at least 3
/// letters total); otherwise the first candidate seen.
pub fn pick_preferred<'a>(candidates: &'a [TextCandidate], config: &NormalizeConfig) -> Option<&'a TextCandidate> {
    if candidates.is_empty() {
        return None;
    }

    for lang in &config.preferred_languages {
        if let Some(found) = candidates.iter().find(|c| c.lang.as_deref() == Some(lang.as_str())) {
            return Some(found);
        }
    }

    if config.latin_preference {
        if let Some(found) = candidates.iter().find(|c| is_mostly_latin(&c.text)) {
            return Some(found);
        }
    }

    candidates.first()
}

/// True if a string reads as predominantly Latin script: at least 3 letters total, and more
/// than half of them are ASCII letters.
pub fn is_mostly_latin(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 3 {
        return true;
    }
    let latin = letters.iter().filter(|c| c.is_ascii_alphabetic()).count();
    latin * 2 > letters.len()
}

/// With non-Latin-title fallback enabled, replace a mostly-non-Latin `<title>` with the
/// channel's own display name.
pub fn resolve_title(title: &str, channel_display_name: &str, non_latin_title_fallback: bool) -> String {
    if non_latin_title_fallback && !is_mostly_latin(title) {
        channel_display_name.to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(lang: &str, text: &str) -> TextCandidate {
        TextCandidate { lang: Some(lang.to_string()), text: text.to_string() }
    }

    #[test]
    fn prefers_configured_language_over_others() {
        let candidates = vec![candidate("fr", "Le Titre"), candidate("en", "The Title")];
        let config = NormalizeConfig { preferred_languages: vec!["en".to_string()], latin_preference: false };
        let chosen = pick_preferred(&candidates, &config).unwrap();
        assert_eq!(chosen.text, "The Title");
    }

    #[test]
    fn falls_back_to_latin_preference_when_no_language_match() {
        let candidates = vec![candidate("zh", "新闻节目标题"), candidate("en", "News Program")];
        let config = NormalizeConfig { preferred_languages: vec!["fr".to_string()], latin_preference: true };
        let chosen = pick_preferred(&candidates, &config).unwrap();
        assert_eq!(chosen.text, "News Program");
    }

    #[test]
    fn falls_back_to_first_when_nothing_matches() {
        let candidates = vec![candidate("zh", "新闻"), candidate("ja", "ニュース")];
        let config = NormalizeConfig { preferred_languages: vec!["fr".to_string()], latin_preference: false };
        let chosen = pick_preferred(&candidates, &config).unwrap();
        assert_eq!(chosen.text, "新闻");
    }

    #[test]
    fn mostly_latin_detection() {
        assert!(is_mostly_latin("The Title"));
        assert!(!is_mostly_latin("新闻节目标题"));
        assert!(is_mostly_latin("Hi")); // fewer than 3 letters, default to true
    }

    #[test]
    fn non_latin_title_fallback_replaces_with_display_name() {
        let resolved = resolve_title("新闻节目标题", "CBC News", true);
        assert_eq!(resolved, "CBC News");
        let resolved = resolve_title("The Title", "CBC News", true);
        assert_eq!(resolved, "The Title");
    }
}
