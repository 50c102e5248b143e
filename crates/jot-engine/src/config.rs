//! Runtime Configuration

use std::time::Duration;

use jot_a11y::Orientation;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Longest accepted auto-focus settle delay
pub const MAX_SETTLE_DELAY_MS: u64 = 10_000;

/// Focus runtime configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delay before auto-focusing inserted content (milliseconds)
    pub settle_delay_ms: u64,

    /// Content observers announce changes
    pub announce_changes: bool,

    /// Restoration stack depth that triggers a leak warning
    pub history_warn_depth: usize,

    /// Orientation for roving widgets mounted without one
    pub default_orientation: Orientation,

    /// `tracing` filter directive installed by [`Config::init_logging`]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            announce_changes: true,
            history_warn_depth: 32,
            default_orientation: Orientation::Horizontal,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(EngineError::InvalidConfig(format!(
                "settle_delay_ms must be at most {MAX_SETTLE_DELAY_MS}, got {}",
                self.settle_delay_ms
            )));
        }
        if self.history_warn_depth == 0 {
            return Err(EngineError::InvalidConfig("history_warn_depth must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Install the fmt subscriber with `log_filter`. Returns false if one
    /// was already installed.
    pub fn init_logging(&self) -> bool {
        crate::logging::init(&self.log_filter)
    }
}
