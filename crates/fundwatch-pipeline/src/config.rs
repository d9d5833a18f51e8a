//! Combined configuration for every pipeline stage

use crate::PipelineError;
use fundwatch_normalizer::NormalizerConfig;
use fundwatch_queue::QueueConfig;
use fundwatch_reconciler::ReconcileConfig;
use fundwatch_resolver::ResolverConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the whole pipeline
///
/// Each stage keeps its own section; a missing section takes that stage's
/// defaults.
///
/// # Examples
///
/// ```
/// use fundwatch_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_toml(r#"
///     [resolver]
///     similarity_floor = 0.9
///
///     [queue.sla]
///     high_hours = 12
/// "#).unwrap();
///
/// assert_eq!(config.resolver.similarity_floor, 0.9);
/// assert_eq!(config.queue.sla.high_hours, 12);
/// assert_eq!(config.queue.sla.medium_hours, 72);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Record normalization
    pub normalizer: NormalizerConfig,
    /// Entity resolution
    pub resolver: ResolverConfig,
    /// Conflict detection and auto-commit policy
    pub reconcile: ReconcileConfig,
    /// Review deadlines and backlog reporting
    pub queue: QueueConfig,
}

impl PipelineConfig {
    /// Strict preset for every stage
    pub fn strict() -> Self {
        Self {
            normalizer: NormalizerConfig::strict(),
            resolver: ResolverConfig::strict(),
            reconcile: ReconcileConfig::strict(),
            queue: QueueConfig::strict(),
        }
    }

    /// Lenient preset for every stage
    pub fn lenient() -> Self {
        Self {
            normalizer: NormalizerConfig::lenient(),
            resolver: ResolverConfig::lenient(),
            reconcile: ReconcileConfig::lenient(),
            queue: QueueConfig::lenient(),
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.normalizer.validate().map_err(|e| format!("normalizer: {}", e))?;
        self.resolver.validate().map_err(|e| format!("resolver: {}", e))?;
        self.reconcile.validate().map_err(|e| format!("reconcile: {}", e))?;
        self.queue.validate().map_err(|e| format!("queue: {}", e))?;
        Ok(())
    }

    /// Load and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, PipelineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate().map_err(PipelineError::Config)?;
        Ok(config)
    }
}
