//! Conflict detection and the auto-commit policy

use crate::comparator::{all_agree, values_agree};
use crate::committer::commit;
use crate::scoring::{live_claims, pick_winner, score_claims, ClaimScore};
use crate::{ReconcileConfig, ReconcileError};
use fundwatch_domain::{
    ClaimId, CommitOutcome, CommitRequest, CommittedFact, Conflict, ConflictId, EntityId,
    FactClaim, FactRecord, FieldKey, FundingStore, Provenance, SlaPolicy, TaskId, TaskKind,
    TaskSubject, VerificationTask,
};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// What reconciling one (entity, field key) did
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No live claims remain for the key
    NoLiveClaims,

    /// Live claims agreed (or a lone claim was trusted) and the value advanced
    Committed {
        /// The history entry written
        record: FactRecord,
        /// Confidence of the claim whose value was committed
        confidence: f64,
    },

    /// The agreed value was already committed with the same backing claims
    Unchanged {
        /// Current revision
        revision: u64,
    },

    /// Every live claim agrees with a reviewed value; it stands
    Settled {
        /// Current revision
        revision: u64,
    },

    /// A lone claim scored below the auto-accept threshold
    LowConfidence {
        /// Open low-confidence task for the key
        task_id: TaskId,
        /// The claim under review
        claim_id: ClaimId,
        /// Its confidence
        confidence: f64,
        /// Whether the task was created by this call
        new_task: bool,
    },

    /// Live claims disagree
    Conflict {
        /// Open conflict for the key
        conflict_id: ConflictId,
        /// Open conflict task for the key
        task_id: TaskId,
        /// Scores of the live claims
        scores: Vec<ClaimScore>,
        /// Whether the conflict was opened by this call
        new_conflict: bool,
    },
}

impl Decision {
    /// Whether the decision left work for a reviewer
    pub fn needs_review(&self) -> bool {
        matches!(self, Decision::LowConfidence { .. } | Decision::Conflict { .. })
    }
}

/// Applies the reconciliation policy to one (entity, field key) at a time
///
/// Callers must serialize calls for the same entity; two concurrent runs for
/// one entity could both see "no conflict".
pub struct Reconciler {
    config: ReconcileConfig,
    sla: SlaPolicy,
}

impl Reconciler {
    /// Create a reconciler with the given policy and review deadlines
    pub fn new(config: ReconcileConfig, sla: SlaPolicy) -> Result<Self, ReconcileError> {
        config.validate().map_err(ReconcileError::Config)?;
        sla.validate().map_err(ReconcileError::Config)?;
        Ok(Self { config, sla })
    }

    /// Create a reconciler with default policy and deadlines
    pub fn with_defaults() -> Self {
        Self {
            config: ReconcileConfig::default(),
            sla: SlaPolicy::default(),
        }
    }

    /// Get the reconciliation policy
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Get the review deadlines
    pub fn sla(&self) -> &SlaPolicy {
        &self.sla
    }

    /// Re-evaluate the live claims of one key and act on them
    pub fn reconcile<S: FundingStore>(
        &self,
        store: &mut S,
        entity: EntityId,
        key: &FieldKey,
        now: u64,
    ) -> Result<Decision, ReconcileError>
    where
        S::Error: Display,
    {
        let claims = store.claims_for(entity, key).map_err(store_err)?;
        let adjudicated = store.adjudicated_claims(entity, key).map_err(store_err)?;
        let live = live_claims(claims, &adjudicated);
        if live.is_empty() {
            return Ok(Decision::NoLiveClaims);
        }

        let scores = score_claims(&live, now, &self.config);
        let current = store.current_fact(entity, key).map_err(store_err)?;

        // An open conflict absorbs every live claim until a reviewer closes it
        if let Some(conflict) = store.open_conflict_for(entity, key).map_err(store_err)? {
            return self.attach_to_conflict(store, conflict, &live, scores, now);
        }

        // A reviewed value anchors agreement
        if let Some(fact) = current.as_ref().filter(|f| f.provenance.is_reviewed()) {
            return self.check_against_review(store, entity, key, fact, &live, scores, now);
        }

        if live.len() == 1 {
            let score = scores.into_iter().next().ok_or_else(|| {
                ReconcileError::NotFound(format!("score for live claim on {}", key))
            })?;
            if score.confidence >= self.config.auto_accept_threshold {
                return self.auto_commit(store, entity, key, &score, &live, current.as_ref(), now);
            }
            return self.flag_low_confidence(store, entity, key, score, now);
        }

        if all_agree(live.iter().map(|c| &c.value), self.config.money_tolerance) {
            let winner = pick_winner(&scores).cloned().ok_or_else(|| {
                ReconcileError::NotFound(format!("winning claim on {}", key))
            })?;
            return self.auto_commit(store, entity, key, &winner, &live, current.as_ref(), now);
        }

        self.open_conflict(store, entity, key, &live, scores, now)
    }

    /// Commit the winning value with auto-accepted provenance
    #[allow(clippy::too_many_arguments)]
    fn auto_commit<S: FundingStore>(
        &self,
        store: &mut S,
        entity: EntityId,
        key: &FieldKey,
        winner: &ClaimScore,
        live: &[FactClaim],
        current: Option<&CommittedFact>,
        now: u64,
    ) -> Result<Decision, ReconcileError>
    where
        S::Error: Display,
    {
        let request = CommitRequest {
            entity_id: entity,
            key: key.clone(),
            value: winner.value.clone(),
            provenance: Provenance::auto_accepted(live.iter().map(|c| c.id)),
            expected_revision: Some(current.map_or(0, |f| f.revision)),
            committed_at: now,
        };

        match commit(store, &request)? {
            CommitOutcome::Committed(record) => {
                info!(
                    entity = %entity,
                    key = %key,
                    claims = live.len(),
                    confidence = winner.confidence,
                    "Auto-committed"
                );
                Ok(Decision::Committed { record, confidence: winner.confidence })
            }
            CommitOutcome::Unchanged { revision } => Ok(Decision::Unchanged { revision }),
            CommitOutcome::Stale { expected, actual } => {
                Err(ReconcileError::StaleCommit { expected, actual })
            }
        }
    }

    /// Open a conflict if any live claim disputes the reviewed value
    #[allow(clippy::too_many_arguments)]
    fn check_against_review<S: FundingStore>(
        &self,
        store: &mut S,
        entity: EntityId,
        key: &FieldKey,
        fact: &CommittedFact,
        live: &[FactClaim],
        scores: Vec<ClaimScore>,
        now: u64,
    ) -> Result<Decision, ReconcileError>
    where
        S::Error: Display,
    {
        let disputed = live
            .iter()
            .any(|c| !values_agree(&c.value, &fact.value, self.config.money_tolerance));
        if !disputed {
            debug!(entity = %entity, key = %key, "Live claims agree with reviewed value");
            return Ok(Decision::Settled { revision: fact.revision });
        }

        warn!(entity = %entity, key = %key, "New claim disputes a reviewed value");
        self.open_conflict(store, entity, key, live, scores, now)
    }

    fn open_conflict<S: FundingStore>(
        &self,
        store: &mut S,
        entity: EntityId,
        key: &FieldKey,
        live: &[FactClaim],
        scores: Vec<ClaimScore>,
        now: u64,
    ) -> Result<Decision, ReconcileError>
    where
        S::Error: Display,
    {
        let conflict = Conflict::open(entity, key.clone(), live.iter().map(|c| c.id), now);
        store.insert_conflict(&conflict).map_err(store_err)?;
        info!(
            entity = %entity,
            key = %key,
            conflict = %conflict.id,
            claims = conflict.contending_claims.len(),
            "Opened conflict"
        );

        let task_id = self.ensure_conflict_task(store, &conflict, now)?;
        Ok(Decision::Conflict {
            conflict_id: conflict.id,
            task_id,
            scores,
            new_conflict: true,
        })
    }

    fn attach_to_conflict<S: FundingStore>(
        &self,
        store: &mut S,
        conflict: Conflict,
        live: &[FactClaim],
        scores: Vec<ClaimScore>,
        now: u64,
    ) -> Result<Decision, ReconcileError>
    where
        S::Error: Display,
    {
        let missing = conflict.missing_claims(live.iter().map(|c| &c.id));
        if !missing.is_empty() {
            store.attach_claims(conflict.id, &missing).map_err(store_err)?;
            info!(
                conflict = %conflict.id,
                attached = missing.len(),
                "Attached claims to open conflict"
            );
        }

        let task_id = self.ensure_conflict_task(store, &conflict, now)?;
        Ok(Decision::Conflict {
            conflict_id: conflict.id,
            task_id,
            scores,
            new_conflict: false,
        })
    }

    /// Reuse the open conflict task for the key, or create one
    fn ensure_conflict_task<S: FundingStore>(
        &self,
        store: &mut S,
        conflict: &Conflict,
        now: u64,
    ) -> Result<TaskId, ReconcileError>
    where
        S::Error: Display,
    {
        if let Some(task) = store
            .open_task_for(conflict.entity_id, &conflict.key, TaskKind::Conflict)
            .map_err(store_err)?
        {
            return Ok(task.id);
        }

        let priority = conflict.key.field.review_priority();
        let task = VerificationTask::new(
            TaskKind::Conflict,
            TaskSubject::Conflict { conflict_id: conflict.id },
            conflict.entity_id,
            conflict.key.clone(),
            priority,
            now,
            self.sla.due_at(priority, now),
        );
        store.insert_task(&task).map_err(store_err)?;
        info!(task = %task.id, priority = %priority, due_at = task.due_at, "Created conflict task");
        Ok(task.id)
    }

    fn flag_low_confidence<S: FundingStore>(
        &self,
        store: &mut S,
        entity: EntityId,
        key: &FieldKey,
        score: ClaimScore,
        now: u64,
    ) -> Result<Decision, ReconcileError>
    where
        S::Error: Display,
    {
        if let Some(task) = store
            .open_task_for(entity, key, TaskKind::LowConfidence)
            .map_err(store_err)?
        {
            debug!(task = %task.id, key = %key, "Low-confidence task already open");
            return Ok(Decision::LowConfidence {
                task_id: task.id,
                claim_id: score.claim_id,
                confidence: score.confidence,
                new_task: false,
            });
        }

        let priority = key.field.review_priority();
        let task = VerificationTask::new(
            TaskKind::LowConfidence,
            TaskSubject::Claim { claim_id: score.claim_id },
            entity,
            key.clone(),
            priority,
            now,
            self.sla.due_at(priority, now),
        );
        store.insert_task(&task).map_err(store_err)?;
        info!(
            task = %task.id,
            entity = %entity,
            key = %key,
            confidence = score.confidence,
            "Created low-confidence task"
        );

        Ok(Decision::LowConfidence {
            task_id: task.id,
            claim_id: score.claim_id,
            confidence: score.confidence,
            new_task: true,
        })
    }
}

fn store_err<E: Display>(e: E) -> ReconcileError {
    ReconcileError::Store(e.to_string())
}
