//! On-disk supervisor configuration: a JSON file naming the child tuner instances to launch
//! under one supervising process.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::defaults::default_restart_delay;
use crate::config::duration_serde;
use crate::errors::{AppError, AppResult};

/// One child tuner process to launch.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Instance {
    /// Unique among all instances in the config; used as the `[name]` log prefix.
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Merged onto the sanitized parent environment; last write wins.
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// The supervisor's own config file: `{restart, restartDelay, instances}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorConfig {
    #[serde(default = "crate::config::defaults::default_true")]
    pub restart: bool,
    #[serde(default = "default_restart_delay", with = "duration_serde")]
    pub restart_delay: Duration,
    pub instances: Vec<Instance>,
}

impl SupervisorConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            AppError::configuration(format!("failed to read supervisor config {}: {e}", path.display()))
        })?;
        let config: SupervisorConfig = serde_json::from_str(&body)
            .map_err(|e| AppError::configuration(format!("invalid supervisor config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for instance in &self.instances {
            if instance.name.is_empty() {
                return Err(AppError::configuration("supervisor instance name must not be empty"));
            }
            if !seen.insert(instance.name.as_str()) {
                return Err(AppError::configuration(format!(
                    "duplicate supervisor instance name: {}",
                    instance.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_instance_names() {
        let config = SupervisorConfig {
            restart: true,
            restart_delay: Duration::from_secs(2),
            instances: vec![
                Instance { name: "a".into(), args: vec![], env: HashMap::new(), dir: None },
                Instance { name: "a".into(), args: vec![], env: HashMap::new(), dir: None },
            ],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_minimal_json_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supervisor.json");
        std::fs::write(
            &path,
            r#"{"instances":[{"name":"primary","args":["--config","a.toml"]}]}"#,
        )
        .unwrap();

        let config = SupervisorConfig::load(&path).unwrap();
        assert!(config.restart);
        assert_eq!(config.restart_delay, Duration::from_secs(2));
        assert_eq!(config.instances.len(), 1);
        assert_eq!(config.instances[0].name, "primary");
    }

    #[test]
    fn load_surfaces_duplicate_name_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supervisor.json");
        std::fs::write(
            &path,
            r#"{"instances":[{"name":"a"},{"name":"a"}]}"#,
        )
        .unwrap();

        assert!(SupervisorConfig::load(&path).is_err());
    }
}
