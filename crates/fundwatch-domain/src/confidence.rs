//! Confidence scoring
//!
//! Implements the deterministic formula for the confidence of one claim from
//! source reliability, corroboration by other sources and recency:
//!
//! 1. Evidence weight: `e = reliability(source) * 0.5^(age / half_life)`
//! 2. Corroboration: `support = 1 - (1 - e_self) * Π(1 - corroboration_weight * e_agree)`
//! 3. Contradiction: `penalty = max(0, 1 - contradiction_weight * Σ e_disagree)`
//! 4. `confidence = clamp(support * penalty, 0, 1)`
//!
//! Adding an agreeing source can only raise `support`; adding a disagreeing
//! source can only lower `penalty`.

use crate::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default weight applied to corroborating sources
pub const CORROBORATION_WEIGHT: f64 = 0.8;

/// Default weight applied to contradicting sources
pub const CONTRADICTION_WEIGHT: f64 = 0.5;

/// Default half-life of claim recency (180 days)
pub const HALF_LIFE_SECS: u64 = 180 * 86_400;

/// Fixed reliability tier of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityTier {
    /// Regulatory filings, analyst-verified entry
    Primary,
    /// Structured data providers
    Structured,
    /// News coverage
    Editorial,
    /// Crowd-sourced or unverified
    Community,
}

impl ReliabilityTier {
    /// Reliability weight in [0, 1]
    pub fn weight(&self) -> f64 {
        match self {
            ReliabilityTier::Primary => 0.95,
            ReliabilityTier::Structured => 0.85,
            ReliabilityTier::Editorial => 0.7,
            ReliabilityTier::Community => 0.5,
        }
    }

    /// Tier assumed for a source kind when no override is configured
    pub fn default_for(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Manual => ReliabilityTier::Primary,
            SourceKind::Api => ReliabilityTier::Structured,
            SourceKind::News => ReliabilityTier::Editorial,
        }
    }
}

/// Configuration for confidence computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Weight of each corroborating source's evidence
    pub corroboration_weight: f64,
    /// Weight of each contradicting source's evidence
    pub contradiction_weight: f64,
    /// Recency half-life in seconds
    pub half_life_secs: u64,
    /// Per-source reliability overrides, keyed by source id
    pub source_tiers: BTreeMap<String, ReliabilityTier>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            corroboration_weight: CORROBORATION_WEIGHT,
            contradiction_weight: CONTRADICTION_WEIGHT,
            half_life_secs: HALF_LIFE_SECS,
            source_tiers: BTreeMap::new(),
        }
    }
}

impl ConfidenceConfig {
    /// Reliability weight for a source
    pub fn reliability(&self, source_id: &str, kind: SourceKind) -> f64 {
        self.source_tiers
            .get(source_id)
            .copied()
            .unwrap_or_else(|| ReliabilityTier::default_for(kind))
            .weight()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.corroboration_weight) {
            return Err("corroboration_weight must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.contradiction_weight) {
            return Err("contradiction_weight must be in [0, 1]".to_string());
        }
        if self.half_life_secs == 0 {
            return Err("half_life_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Inputs about one source's claim needed for scoring
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvidence {
    /// Source reliability weight in [0, 1]
    pub reliability: f64,
    /// When the claimed event happened
    pub observed_at: u64,
}

impl SourceEvidence {
    /// Create evidence data
    pub fn new(reliability: f64, observed_at: u64) -> Self {
        Self { reliability, observed_at }
    }
}

/// Compute the confidence of one claim
///
/// # Arguments
/// * `own` - evidence of the claim being scored
/// * `agreeing` - evidence of other independent sources whose live claims agree
/// * `disagreeing` - evidence of sources whose live claims disagree
/// * `now` - current timestamp for recency decay
/// * `config` - weights and half-life
pub fn compute_claim_confidence(
    own: &SourceEvidence,
    agreeing: &[SourceEvidence],
    disagreeing: &[SourceEvidence],
    now: u64,
    config: &ConfidenceConfig,
) -> f64 {
    // Step 1: evidence weight of the claim itself
    let own_weight = evidence_weight(own, now, config.half_life_secs);

    // Step 2: corroboration
    let unsupported = agreeing
        .iter()
        .map(|e| 1.0 - config.corroboration_weight * evidence_weight(e, now, config.half_life_secs))
        .product::<f64>();
    let support = 1.0 - (1.0 - own_weight) * unsupported;

    // Step 3: contradiction
    let contradiction: f64 = disagreeing
        .iter()
        .map(|e| evidence_weight(e, now, config.half_life_secs))
        .sum();
    let penalty = (1.0 - config.contradiction_weight * contradiction).max(0.0);

    // Step 4
    (support * penalty).clamp(0.0, 1.0)
}

/// Reliability scaled by recency decay
fn evidence_weight(evidence: &SourceEvidence, now: u64, half_life_secs: u64) -> f64 {
    evidence.reliability.clamp(0.0, 1.0) * recency_factor(now, evidence.observed_at, half_life_secs)
}

/// Half-life decay on the age of the observed event
fn recency_factor(now: u64, observed_at: u64, half_life_secs: u64) -> f64 {
    if now <= observed_at || half_life_secs == 0 {
        return 1.0;
    }

    let half_lives = (now - observed_at) as f64 / half_life_secs as f64;
    0.5_f64.powf(half_lives)
}
