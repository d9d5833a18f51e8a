//! Configuration for the Normalizer

use serde::{Deserialize, Serialize};

/// Configuration for the Normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Maximum length of free-text values (characters); longer text is truncated
    pub max_text_length: usize,

    /// Treat empty or whitespace-only strings as missing values
    pub empty_as_missing: bool,
}

impl NormalizerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for NormalizerConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 2_000,
            empty_as_missing: true,
        }
    }
}

impl NormalizerConfig {
    /// Strict preset: short text, empty strings are missing
    pub fn strict() -> Self {
        Self {
            max_text_length: 500,
            empty_as_missing: true,
        }
    }

    /// Lenient preset: long text, empty strings are kept as values
    pub fn lenient() -> Self {
        Self {
            max_text_length: 10_000,
            empty_as_missing: false,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
