//! Reconciliation policy configuration

use crate::ReconcileError;
use fundwatch_domain::ConfidenceConfig;
use serde::{Deserialize, Serialize};

/// Policy for agreement, scoring and auto-commit
///
/// # Examples
///
/// ```
/// use fundwatch_reconciler::ReconcileConfig;
///
/// let config = ReconcileConfig::default();
/// assert_eq!(config.money_tolerance, 0.02);
/// assert_eq!(config.auto_accept_threshold, 0.6);
///
/// let strict = ReconcileConfig::strict();
/// assert!(strict.money_tolerance < config.money_tolerance);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Relative tolerance for money agreement, against the larger magnitude
    pub money_tolerance: f64,

    /// Minimum confidence for a lone claim to commit without review
    pub auto_accept_threshold: f64,

    /// Confidence weights, half-life and source reliability overrides
    pub confidence: ConfidenceConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            money_tolerance: 0.02,
            auto_accept_threshold: 0.6,
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl ReconcileConfig {
    /// Tighter tolerance and a higher bar for lone claims
    pub fn strict() -> Self {
        Self {
            money_tolerance: 0.01,
            auto_accept_threshold: 0.75,
            ..Default::default()
        }
    }

    /// Looser tolerance and a lower bar for lone claims
    pub fn lenient() -> Self {
        Self {
            money_tolerance: 0.05,
            auto_accept_threshold: 0.5,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.money_tolerance) {
            return Err(format!(
                "money_tolerance must be in [0, 1), got {}",
                self.money_tolerance
            ));
        }
        if !(0.0..=1.0).contains(&self.auto_accept_threshold) {
            return Err(format!(
                "auto_accept_threshold must be in [0, 1], got {}",
                self.auto_accept_threshold
            ));
        }
        self.confidence.validate()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ReconcileError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ReconcileError::Config(e.to_string()))?;
        config.validate().map_err(ReconcileError::Config)?;
        Ok(config)
    }
}
