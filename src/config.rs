use crate::browser;
use crate::tiles::weights::BLOCKED_WEIGHT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine wide switches, usually shipped next to the game as `engine.json`
/// - every field is optional, missing ones take the defaults below
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// development build, turns on the extra tracing
    pub dev: bool,
    /// trace every action a script runs, follows `dev` when not given
    pub trace_actions: Option<bool>,
    /// weights at or above this count as impassable in diagnostics
    pub blocked_weight: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dev: false,
            trace_actions: None,
            blocked_weight: BLOCKED_WEIGHT,
        }
    }
}

impl EngineConfig {
    const CONFIG_PATH: &'static str = "engine.json";

    pub fn dev() -> Self {
        EngineConfig {
            dev: true,
            ..Self::default()
        }
    }

    pub fn traces_actions(&self) -> bool {
        self.trace_actions.unwrap_or(self.dev)
    }

    pub async fn fetch(path: &str) -> Result<Self> {
        browser::fetch_json::<Self>(path)
            .await
            .with_context(|| format!("Failed to load engine config from : {}", path))
    }

    pub async fn fetch_default() -> Result<Self> {
        Self::fetch(Self::CONFIG_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.blocked_weight, 100);
        assert!(!config.traces_actions());
    }

    #[test]
    fn action_tracing_follows_dev_unless_set() {
        let config: EngineConfig = serde_json::from_str(r#"{"dev": true}"#).unwrap();
        assert!(config.traces_actions());

        let quiet: EngineConfig =
            serde_json::from_str(r#"{"dev": true, "trace_actions": false, "blocked_weight": 90}"#)
                .unwrap();
        assert!(!quiet.traces_actions());
        assert_eq!(quiet.blocked_weight, 90);
    }
}
