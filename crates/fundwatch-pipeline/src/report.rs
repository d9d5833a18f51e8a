//! Ingest run summary

use fundwatch_domain::TaskId;
use fundwatch_normalizer::NormalizeReport;
use fundwatch_reconciler::Decision;
use fundwatch_resolver::Resolution;
use serde::Serialize;

/// What one ingest run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Normalization accounting (records, drops, malformed)
    pub normalize: NormalizeReport,
    /// Claims appended to the store
    pub claims_stored: usize,
    /// Claims skipped because a name could not be resolved
    pub claims_skipped: usize,
    /// Claims stored whose key could not be reconciled
    pub unreconciled: usize,
    /// Entities created on first sighting
    pub entities_created: usize,
    /// Names matched to an existing entity
    pub entities_matched: usize,
    /// Names that matched several entities equally well
    pub ambiguous_names: usize,
    /// Values committed automatically
    pub committed: usize,
    /// Keys whose value was already current
    pub unchanged: usize,
    /// Conflicts opened
    pub conflicts_opened: usize,
    /// Conflicts that absorbed new claims
    pub conflicts_updated: usize,
    /// Keys waiting on a low-confidence review
    pub low_confidence: usize,
    /// Review tasks created by this run
    pub tasks_created: Vec<TaskId>,
}

impl IngestReport {
    pub(crate) fn record_resolution(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Created { .. } => self.entities_created += 1,
            Resolution::Matched { .. } => self.entities_matched += 1,
            Resolution::Ambiguous { .. } => {
                self.entities_created += 1;
                self.ambiguous_names += 1;
            }
        }
    }

    pub(crate) fn record_decision(&mut self, decision: &Decision) {
        match decision {
            Decision::NoLiveClaims | Decision::Settled { .. } => {}
            Decision::Committed { .. } => self.committed += 1,
            Decision::Unchanged { .. } => self.unchanged += 1,
            Decision::LowConfidence { task_id, new_task, .. } => {
                self.low_confidence += 1;
                if *new_task {
                    self.tasks_created.push(*task_id);
                }
            }
            Decision::Conflict { task_id, new_conflict, .. } => {
                if *new_conflict {
                    self.conflicts_opened += 1;
                    self.tasks_created.push(*task_id);
                } else {
                    self.conflicts_updated += 1;
                }
            }
        }
    }

    /// Whether the run left anything for reviewers
    pub fn needs_review(&self) -> bool {
        !self.tasks_created.is_empty()
    }
}
