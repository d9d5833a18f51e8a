//! Configuration for the verification queue
//!
//! Defines review deadlines per priority and the backlog sweep interval.

use crate::QueueError;
use fundwatch_domain::SlaPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the verification queue
///
/// # Examples
///
/// ```
/// use fundwatch_queue::QueueConfig;
///
/// let config = QueueConfig::default();
/// assert_eq!(config.sla.high_hours, 24);
/// assert_eq!(config.sla.medium_hours, 72);
/// assert_eq!(config.sla.low_hours, 168);
///
/// let strict = QueueConfig::strict();
/// assert!(strict.sla.high_hours < config.sla.high_hours);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Review deadline per priority
    pub sla: SlaPolicy,

    /// How often the backlog worker reports (in seconds)
    /// Default: every 5 minutes
    pub sweep_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            sla: SlaPolicy::default(),
            sweep_interval_secs: 300,
        }
    }
}

impl QueueConfig {
    /// Tight deadlines and frequent reports
    ///
    /// - High: 12 hours
    /// - Medium: 48 hours
    /// - Low: 5 days
    pub fn strict() -> Self {
        Self {
            sla: SlaPolicy {
                high_hours: 12,
                medium_hours: 48,
                low_hours: 5 * 24,
            },
            sweep_interval_secs: 60,
        }
    }

    /// Relaxed deadlines for small review teams
    ///
    /// - High: 48 hours
    /// - Medium: 7 days
    /// - Low: 14 days
    pub fn lenient() -> Self {
        Self {
            sla: SlaPolicy {
                high_hours: 48,
                medium_hours: 7 * 24,
                low_hours: 14 * 24,
            },
            sweep_interval_secs: 900,
        }
    }

    /// Get the sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        self.sla.validate()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, QueueError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| QueueError::Config(e.to_string()))?;
        config.validate().map_err(QueueError::Config)?;
        Ok(config)
    }
}
