//! Dispatch queue configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::DispatchError;

const DEFAULT_STARVATION_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_WATCHDOG_INTERVAL_MS: u64 = 6_000;

/// Watchdog timing configuration for a dispatch queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Forced-recovery threshold in milliseconds: if the queue is delayed and
    /// no task has made progress for this long, the watchdog forces the
    /// queue open.
    #[serde(default = "default_starvation_timeout_ms")]
    pub starvation_timeout_ms: u64,
    /// Interval in milliseconds between watchdog checks.
    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
}

const fn default_starvation_timeout_ms() -> u64 {
    DEFAULT_STARVATION_TIMEOUT_MS
}

const fn default_watchdog_interval_ms() -> u64 {
    DEFAULT_WATCHDOG_INTERVAL_MS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            starvation_timeout_ms: DEFAULT_STARVATION_TIMEOUT_MS,
            watchdog_interval_ms: DEFAULT_WATCHDOG_INTERVAL_MS,
        }
    }
}

impl QueueConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.starvation_timeout_ms == 0 {
            return Err(DispatchError::InvalidConfig(
                "starvation_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.watchdog_interval_ms == 0 {
            return Err(DispatchError::InvalidConfig(
                "watchdog_interval_ms must be greater than 0".into(),
            ));
        }
        if self.watchdog_interval_ms > self.starvation_timeout_ms {
            return Err(DispatchError::InvalidConfig(
                "watchdog_interval_ms must not exceed starvation_timeout_ms".into(),
            ));
        }
        Ok(())
    }

    /// Parse a queue configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, DispatchError> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub(crate) const fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }
}
