//! Environment sanitization for supervised children.
//!
//! Children inherit the supervisor's own environment minus a blocklist of variables that
//! only make sense for *this* process (Plex-reaper wiring, PMS URL/token), then have the
//! instance's own `env` map merged on top with last-write-wins.

use std::collections::HashMap;

/// Parent-process variables stripped before merging in an instance's own env, so a child
/// does not inherit this process's Plex-reaper/PMS wiring unless it asks for it explicitly.
const BLOCKLIST_PREFIXES: &[&str] = &["PLEX_REAPER_", "PMS_URL", "PMS_TOKEN"];

/// Build the full environment for a child instance: `parent_env` filtered through the
/// blocklist, then `instance_env` merged on top (last write wins).
pub fn build_child_env(
    parent_env: impl Iterator<Item = (String, String)>,
    instance_env: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged: HashMap<String, String> =
        parent_env.filter(|(key, _)| !is_blocked(key)).collect();
    for (key, value) in instance_env {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn is_blocked(key: &str) -> bool {
    BLOCKLIST_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_blocklisted_parent_vars() {
        let parent = vec![
            ("PLEX_REAPER_TOKEN".to_string(), "secret".to_string()),
            ("PMS_URL".to_string(), "http://plex.local".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let merged = build_child_env(parent.into_iter(), &HashMap::new());
        assert!(!merged.contains_key("PLEX_REAPER_TOKEN"));
        assert!(!merged.contains_key("PMS_URL"));
        assert_eq!(merged.get("HOME").unwrap(), "/root");
    }

    #[test]
    fn instance_env_overrides_parent_last_write_wins() {
        let parent = vec![("PLEX_TUNER_PORT".to_string(), "5004".to_string())];
        let mut instance_env = HashMap::new();
        instance_env.insert("PLEX_TUNER_PORT".to_string(), "5005".to_string());

        let merged = build_child_env(parent.into_iter(), &instance_env);
        assert_eq!(merged.get("PLEX_TUNER_PORT").unwrap(), "5005");
    }

    #[test]
    fn instance_env_can_reintroduce_a_blocked_var_explicitly() {
        let mut instance_env = HashMap::new();
        instance_env.insert("PMS_URL".to_string(), "http://override".to_string());

        let merged = build_child_env(std::iter::empty(), &instance_env);
        assert_eq!(merged.get("PMS_URL").unwrap(), "http://override");
    }
}
