//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Configuration for entity resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum fuzzy score for a match
    pub similarity_floor: f64,

    /// Candidates scoring within this distance of the best are ambiguous
    pub ambiguity_margin: f64,

    /// Upper bound on merge hops followed to reach a survivor
    pub max_merge_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_floor: 0.85,
            ambiguity_margin: 0.03,
            max_merge_depth: 16,
        }
    }
}

impl ResolverConfig {
    /// Strict matching: fewer fuzzy matches, more ambiguity review
    pub fn strict() -> Self {
        Self {
            similarity_floor: 0.92,
            ambiguity_margin: 0.05,
            ..Default::default()
        }
    }

    /// Lenient matching: more fuzzy matches
    pub fn lenient() -> Self {
        Self {
            similarity_floor: 0.8,
            ambiguity_margin: 0.02,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.similarity_floor > 0.0 && self.similarity_floor <= 1.0) {
            return Err(format!(
                "similarity_floor must be in (0, 1], got {}",
                self.similarity_floor
            ));
        }
        if !(0.0..1.0).contains(&self.ambiguity_margin) {
            return Err(format!(
                "ambiguity_margin must be in [0, 1), got {}",
                self.ambiguity_margin
            ));
        }
        if self.max_merge_depth == 0 {
            return Err("max_merge_depth must be greater than 0".to_string());
        }
        Ok(())
    }
}
