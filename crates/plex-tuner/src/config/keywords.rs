//! Curated keyword lists driving the lineup category filter and NA-EN affinity score.
//!
//! Keeping the shaper's keyword lists as data, not code, means an
//! implementation can curate them without a rebuild. This module loads them from an optional
//! `lineup_keywords.toml` (resolved the same way `Config` resolves its own file) and
//! falls back to a small compiled-in default set so the binary runs unconfigured.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionKeywords {
    #[serde(default)]
    pub tlds: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupKeywords {
    /// region key (e.g. "na", "uk", "nordics") -> keyword set
    #[serde(default)]
    pub regions: HashMap<String, RegionKeywords>,
    /// category key (e.g. "sports", "news") -> substrings that identify it
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
    /// substrings that mark a channel as music/radio for the pre-cap drop filter
    #[serde(default)]
    pub music_radio: Vec<String>,
    /// substrings that penalize a channel in the NA-EN affinity score
    #[serde(default)]
    pub penalty_terms: Vec<String>,
}

impl Default for LineupKeywords {
    fn default() -> Self {
        let mut regions = HashMap::new();
        regions.insert(
            "na".to_string(),
            RegionKeywords {
                tlds: vec!["us".to_string(), "ca".to_string()],
                cities: vec![
                    "new york".to_string(),
                    "los angeles".to_string(),
                    "chicago".to_string(),
                    "toronto".to_string(),
                    "vancouver".to_string(),
                ],
                networks: vec![
                    "abc".to_string(),
                    "nbc".to_string(),
                    "cbs".to_string(),
                    "fox".to_string(),
                    "cbc".to_string(),
                    "ctv".to_string(),
                ],
            },
        );
        regions.insert(
            "uk".to_string(),
            RegionKeywords {
                tlds: vec!["uk".to_string()],
                cities: vec!["london".to_string(), "manchester".to_string()],
                networks: vec!["bbc".to_string(), "itv".to_string()],
            },
        );

        let mut categories = HashMap::new();
        categories.insert(
            "sports".to_string(),
            vec!["sport".to_string(), "espn".to_string(), "sky sports".to_string()],
        );
        categories.insert("news".to_string(), vec!["news".to_string(), "cnn".to_string(), "bbc news".to_string()]);
        categories.insert("movies".to_string(), vec!["movie".to_string(), "cinema".to_string(), "hbo".to_string()]);
        categories.insert("kids".to_string(), vec!["kids".to_string(), "cartoon".to_string(), "disney".to_string()]);
        categories.insert("music".to_string(), vec!["music".to_string(), "mtv".to_string(), "vh1".to_string()]);

        Self {
            regions,
            categories,
            music_radio: vec![
                "radio".to_string(),
                "fm ".to_string(),
                "music only".to_string(),
            ],
            penalty_terms: vec![
                "shop".to_string(),
                "adult".to_string(),
                "xxx".to_string(),
                "ppv".to_string(),
            ],
        }
    }
}

impl LineupKeywords {
    /// Load from `path` if it exists, falling back to the compiled-in default set. A file
    /// that exists but fails to parse is a configuration error; a missing file is not.
    pub fn load(path: &std::path::Path) -> crate::errors::AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| crate::errors::AppError::configuration(format!("invalid {}: {e}", path.display())))
    }

    pub fn region(&self, name: &str) -> Option<&RegionKeywords> {
        self.regions.get(name)
    }

    pub fn is_music_or_radio(&self, haystack: &str) -> bool {
        let lower = haystack.to_ascii_lowercase();
        self.music_radio.iter().any(|term| lower.contains(term.as_str()))
    }

    pub fn category_for(&self, haystack: &str) -> Option<&str> {
        let lower = haystack.to_ascii_lowercase();
        self.categories
            .iter()
            .find(|(_, terms)| terms.iter().any(|t| lower.contains(t.as_str())))
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keywords_classify_known_examples() {
        let kw = LineupKeywords::default();
        assert!(kw.is_music_or_radio("Classic Rock Radio"));
        assert_eq!(kw.category_for("ESPN Sports HD"), Some("sports"));
        assert!(kw.region("na").unwrap().networks.contains(&"cbc".to_string()));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let kw = LineupKeywords::load(std::path::Path::new("/nonexistent/lineup_keywords.toml")).unwrap();
        assert!(!kw.regions.is_empty());
    }
}
