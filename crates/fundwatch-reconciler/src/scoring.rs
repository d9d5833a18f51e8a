//! Live-claim selection and confidence scoring

use crate::comparator::values_agree;
use crate::ReconcileConfig;
use fundwatch_domain::confidence::compute_claim_confidence;
use fundwatch_domain::{ClaimId, FactClaim, FactValue, SourceEvidence};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Confidence of one live claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimScore {
    /// The scored claim
    pub claim_id: ClaimId,
    /// Its source
    pub source_id: String,
    /// Claimed value
    pub value: FactValue,
    /// When the claimed event happened
    pub observed_at: u64,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

/// Reduce a claim history to the live claims
///
/// Keeps each source's most recent claim by (`observed_at`, `ingested_at`,
/// id), then drops claims already settled by a resolved conflict. The
/// result is ordered by claim id.
pub fn live_claims(claims: Vec<FactClaim>, adjudicated: &BTreeSet<ClaimId>) -> Vec<FactClaim> {
    let mut latest: BTreeMap<String, FactClaim> = BTreeMap::new();
    for claim in claims {
        match latest.get(&claim.source_id) {
            Some(current) if current.recency_key() >= claim.recency_key() => {}
            _ => {
                latest.insert(claim.source_id.clone(), claim);
            }
        }
    }

    let mut live: Vec<FactClaim> = latest
        .into_values()
        .filter(|c| !adjudicated.contains(&c.id))
        .collect();
    live.sort_by_key(|c| c.id);
    live
}

/// Score every live claim against the others
///
/// Each claim is corroborated by the other live claims that agree with it
/// and penalised by those that do not. Live claims come from distinct
/// sources, so every other claim counts as an independent source.
pub fn score_claims(live: &[FactClaim], now: u64, config: &ReconcileConfig) -> Vec<ClaimScore> {
    let evidence: Vec<SourceEvidence> = live
        .iter()
        .map(|c| {
            SourceEvidence::new(
                config.confidence.reliability(&c.source_id, c.source_kind),
                c.observed_at,
            )
        })
        .collect();

    live.iter()
        .enumerate()
        .map(|(i, claim)| {
            let mut agreeing = Vec::new();
            let mut disagreeing = Vec::new();
            for (j, other) in live.iter().enumerate() {
                if i == j {
                    continue;
                }
                if values_agree(&claim.value, &other.value, config.money_tolerance) {
                    agreeing.push(evidence[j].clone());
                } else {
                    disagreeing.push(evidence[j].clone());
                }
            }

            ClaimScore {
                claim_id: claim.id,
                source_id: claim.source_id.clone(),
                value: claim.value.clone(),
                observed_at: claim.observed_at,
                confidence: compute_claim_confidence(
                    &evidence[i],
                    &agreeing,
                    &disagreeing,
                    now,
                    &config.confidence,
                ),
            }
        })
        .collect()
}

/// Pick the score whose value gets committed
///
/// Highest confidence wins; ties go to the later `observed_at`, then the
/// smaller source id, then the smaller claim id.
pub fn pick_winner(scores: &[ClaimScore]) -> Option<&ClaimScore> {
    scores.iter().min_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.observed_at.cmp(&a.observed_at))
            .then_with(|| a.source_id.cmp(&b.source_id))
            .then_with(|| a.claim_id.cmp(&b.claim_id))
    })
}
