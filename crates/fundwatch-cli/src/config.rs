//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use fundwatch_normalizer::NormalizerConfig;
use fundwatch_pipeline::PipelineConfig;
use fundwatch_queue::QueueConfig;
use fundwatch_reconciler::ReconcileConfig;
use fundwatch_resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration, one TOML file.
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the database lives
    #[serde(default)]
    pub store: StoreSettings,

    /// Log filter
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Output defaults
    #[serde(default)]
    pub output: OutputSettings,

    /// Record normalization
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// Entity resolution
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Conflict detection and auto-commit policy
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Review deadlines and backlog reporting
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file; defaults to `~/.fundwatch/fundwatch.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the default config and database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".fundwatch"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the default path is read if
    /// present, otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_toml(&fs::read_to_string(&path)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            return Err(CliError::Config("logging: level must not be empty".into()));
        }
        self.pipeline().validate().map_err(CliError::Config)
    }

    /// Save configuration to a file, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Pipeline settings assembled from the stage sections.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            normalizer: self.normalizer.clone(),
            resolver: self.resolver.clone(),
            reconcile: self.reconcile.clone(),
            queue: self.queue.clone(),
        }
    }

    /// Database file to open.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home()?.join("fundwatch.db")),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
