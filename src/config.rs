use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::phrase::DEFAULT_GROUP_COUNT;

/// Tunables of the backup check flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Number of groups the phrase is split into; one word is hidden per group.
    pub group_count: usize,

    /// Pause between filling the last blank and showing the outcome, so the
    /// failure cue registers before the screen changes.
    pub outcome_delay_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        FlowConfig {
            group_count: DEFAULT_GROUP_COUNT,
            outcome_delay_ms: 1_000,
        }
    }
}

impl FlowConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: FlowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_count == 0 {
            return Err(ConfigError::ZeroGroups);
        }
        Ok(())
    }

    pub fn outcome_delay(&self) -> Duration {
        Duration::from_millis(self.outcome_delay_ms)
    }
}
