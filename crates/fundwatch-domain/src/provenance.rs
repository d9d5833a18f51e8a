//! Provenance tracking for committed facts

use crate::{ClaimId, EntityId, FactValue, FieldKey, TaskId};
use serde::{Deserialize, Serialize};

/// How a value came to be committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceKind {
    /// Committed automatically because live claims agreed
    AutoAccepted,
    /// Committed by a reviewer through a verification task
    Reviewed,
}

/// What backed a committed value
///
/// Two commits with equal provenance and value are the same commit; the
/// committer relies on this equality for idempotency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Automatic or reviewed
    pub kind: ProvenanceKind,
    /// Backing claims, sorted and de-duplicated
    pub claim_ids: Vec<ClaimId>,
    /// Verification task that produced the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Reviewer who resolved the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    /// Reviewer notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Provenance {
    /// Provenance for an automatic commit
    pub fn auto_accepted(claim_ids: impl IntoIterator<Item = ClaimId>) -> Self {
        Self {
            kind: ProvenanceKind::AutoAccepted,
            claim_ids: sorted(claim_ids),
            task_id: None,
            reviewer: None,
            notes: None,
        }
    }

    /// Provenance for a reviewed commit
    pub fn reviewed(
        task_id: TaskId,
        claim_ids: impl IntoIterator<Item = ClaimId>,
        reviewer: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            kind: ProvenanceKind::Reviewed,
            claim_ids: sorted(claim_ids),
            task_id: Some(task_id),
            reviewer,
            notes,
        }
    }

    /// Whether a reviewer produced this value
    pub fn is_reviewed(&self) -> bool {
        self.kind == ProvenanceKind::Reviewed
    }
}

fn sorted(ids: impl IntoIterator<Item = ClaimId>) -> Vec<ClaimId> {
    let mut ids: Vec<ClaimId> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    ids
}

/// One entry of a field's append-only commit history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Entity the fact belongs to
    pub entity_id: EntityId,
    /// Field key
    pub key: FieldKey,
    /// Committed value
    pub value: FactValue,
    /// Revision this entry created
    pub revision: u64,
    /// What backed it
    pub provenance: Provenance,
    /// Commit time
    pub committed_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_order_does_not_affect_equality() {
        let a = ClaimId::from_value(1);
        let b = ClaimId::from_value(2);

        assert_eq!(
            Provenance::auto_accepted([a, b]),
            Provenance::auto_accepted([b, a, b])
        );
    }

    #[test]
    fn test_reviewed_provenance() {
        let task = TaskId::new();
        let p = Provenance::reviewed(task, [], Some("dana".into()), None);
        assert!(p.is_reviewed());
        assert_eq!(p.task_id, Some(task));
        assert!(!Provenance::auto_accepted([]).is_reviewed());
    }
}
