//! The verification queue state machine

use crate::{QueueConfig, QueueError, QueueMetrics};
use fundwatch_domain::{
    AssigneeChange, ClaimId, CommitOutcome, CommitRequest, Conflict, ConflictId, EntityId,
    FactRecord, FactValue, FundingStore, Provenance, TaskFilter, TaskId, TaskStatus,
    TaskSubject, TaskTransition, VerificationTask,
};
use fundwatch_reconciler::{commit, fits_kind, values_agree, ReconcileConfig};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{info, warn};

/// A reviewer's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Accept a value (or, for identity tasks, a match)
    Verified,
    /// Decline; nothing is committed
    Rejected,
}

impl Verdict {
    fn status(self) -> TaskStatus {
        match self {
            Verdict::Verified => TaskStatus::Verified,
            Verdict::Rejected => TaskStatus::Rejected,
        }
    }
}

/// Everything a reviewer submits when closing a task
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRequest {
    /// Verified or rejected
    pub verdict: Verdict,
    /// Accepted value; required for conflict and identity tasks
    pub chosen_value: Option<FactValue>,
    /// Reviewer notes; required for rejection
    pub notes: Option<String>,
    /// Reviewer name; defaults to the task's assignee
    pub reviewer: Option<String>,
}

impl ReviewRequest {
    /// Verify, optionally choosing a value
    pub fn verify(chosen_value: Option<FactValue>) -> Self {
        Self {
            verdict: Verdict::Verified,
            chosen_value,
            notes: None,
            reviewer: None,
        }
    }

    /// Reject with an explanation
    pub fn reject(notes: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Rejected,
            chosen_value: None,
            notes: Some(notes.into()),
            reviewer: None,
        }
    }

    /// Attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Name the reviewer
    pub fn by(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer = Some(reviewer.into());
        self
    }
}

/// Side effects of closing a task
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The task in its terminal state
    pub task: VerificationTask,
    /// History entry written for a verified value
    pub committed: Option<FactRecord>,
    /// Conflict closed by the review
    pub closed_conflict: Option<ConflictId>,
    /// `(provisional, survivor)` when an identity review merged entities
    pub merged: Option<(EntityId, EntityId)>,
}

/// Moves verification tasks through their lifecycle
///
/// Every transition is a compare-and-set in the store, so two reviewers
/// racing for the same task cannot both win.
pub struct VerificationQueue {
    config: QueueConfig,
    policy: ReconcileConfig,
}

impl VerificationQueue {
    /// Create a queue with the given configuration
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        config.validate().map_err(QueueError::Config)?;
        Ok(Self {
            config,
            policy: ReconcileConfig::default(),
        })
    }

    /// Create a queue with default configuration
    pub fn default_config() -> Self {
        Self {
            config: QueueConfig::default(),
            policy: ReconcileConfig::default(),
        }
    }

    /// Use a reconciliation policy for matching chosen values to claims
    pub fn with_policy(mut self, policy: ReconcileConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Get the queue configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Take a pending task for review
    pub fn claim<S: FundingStore>(
        &self,
        store: &mut S,
        task_id: TaskId,
        assignee: &str,
    ) -> Result<VerificationTask, QueueError>
    where
        S::Error: Display,
    {
        let transition = TaskTransition {
            expected: vec![TaskStatus::Pending],
            to: TaskStatus::InReview,
            assignee: AssigneeChange::Set(assignee.to_string()),
            resolution_notes: None,
            chosen_value: None,
            resolved_at: None,
        };
        let task = self.apply(store, task_id, &transition, "claim")?;
        info!(task = %task_id, assignee, "Task claimed");
        Ok(task)
    }

    /// Hand an in-review task back to the pending pool
    pub fn release<S: FundingStore>(
        &self,
        store: &mut S,
        task_id: TaskId,
    ) -> Result<VerificationTask, QueueError>
    where
        S::Error: Display,
    {
        let transition = TaskTransition {
            expected: vec![TaskStatus::InReview],
            to: TaskStatus::Pending,
            assignee: AssigneeChange::Clear,
            resolution_notes: None,
            chosen_value: None,
            resolved_at: None,
        };
        let task = self.apply(store, task_id, &transition, "release")?;
        info!(task = %task_id, "Task released");
        Ok(task)
    }

    /// Close a task as verified or rejected and apply its side effects
    ///
    /// Allowed from pending or in review. Verifying a conflict commits the
    /// chosen value and closes the conflict; rejecting it closes the
    /// conflict without committing. Verifying an identity task merges the
    /// provisional entity into the chosen one.
    pub fn resolve<S: FundingStore>(
        &self,
        store: &mut S,
        task_id: TaskId,
        request: ReviewRequest,
        now: u64,
    ) -> Result<ReviewOutcome, QueueError>
    where
        S::Error: Display,
    {
        let task = load(store, task_id)?;
        if task.status.is_terminal() {
            return Err(QueueError::InvalidTransition {
                task: task_id,
                from: task.status,
                action: "resolve",
            });
        }

        let notes = request.notes.filter(|n| !n.trim().is_empty());
        let value = match request.verdict {
            Verdict::Rejected => {
                if notes.is_none() {
                    return Err(QueueError::NotesRequired);
                }
                None
            }
            Verdict::Verified => Some(self.verified_value(store, &task, request.chosen_value)?),
        };
        let reviewer = request.reviewer.or_else(|| task.assignee.clone());

        let transition = TaskTransition {
            expected: vec![TaskStatus::Pending, TaskStatus::InReview],
            to: request.verdict.status(),
            assignee: AssigneeChange::Keep,
            resolution_notes: notes.clone(),
            chosen_value: value.clone(),
            resolved_at: Some(now),
        };
        let closed = self.apply(store, task_id, &transition, "resolve")?;
        info!(
            task = %task_id,
            kind = %task.kind,
            status = %closed.status,
            reviewer = reviewer.as_deref().unwrap_or("-"),
            "Task resolved"
        );

        let mut outcome = ReviewOutcome {
            task: closed,
            committed: None,
            closed_conflict: None,
            merged: None,
        };

        match (&task.subject, value) {
            (TaskSubject::Conflict { conflict_id }, Some(value)) => {
                let conflict = load_conflict(store, *conflict_id)?;
                let backing = self.agreeing_claims(store, &conflict.contending_claims, &value)?;
                outcome.committed = commit_reviewed(store, &task, value, backing, reviewer, notes, now)?;
                outcome.closed_conflict = close_conflict(store, *conflict_id, now)?;
            }
            (TaskSubject::Conflict { conflict_id }, None) => {
                outcome.closed_conflict = close_conflict(store, *conflict_id, now)?;
            }
            (TaskSubject::Claim { claim_id }, value) => {
                if let Some(value) = value {
                    let backing = self.agreeing_claims(store, &[*claim_id], &value)?;
                    outcome.committed =
                        commit_reviewed(store, &task, value, backing, reviewer, notes, now)?;
                }
                // The claim is settled either way
                let record = Conflict::settled(task.entity_id, task.key.clone(), [*claim_id], now);
                store.insert_conflict(&record).map_err(store_err)?;
            }
            (TaskSubject::Identity { provisional, .. }, Some(FactValue::Entity(survivor))) => {
                store.merge_entities(*provisional, survivor).map_err(store_err)?;
                info!(from = %provisional, into = %survivor, "Merged provisional entity");
                outcome.merged = Some((*provisional, survivor));
            }
            (TaskSubject::Identity { provisional, .. }, _) => {
                info!(entity = %provisional, "Provisional entity kept distinct");
            }
        }

        Ok(outcome)
    }

    /// Open tasks past their deadline, most urgent first
    pub fn overdue<S: FundingStore>(
        &self,
        store: &S,
        now: u64,
    ) -> Result<Vec<VerificationTask>, QueueError>
    where
        S::Error: Display,
    {
        self.list(
            store,
            &TaskFilter {
                open_only: true,
                due_before: Some(now),
                ..Default::default()
            },
        )
    }

    /// Tasks matching a filter, ordered by (due_at, priority, created_at)
    pub fn list<S: FundingStore>(
        &self,
        store: &S,
        filter: &TaskFilter,
    ) -> Result<Vec<VerificationTask>, QueueError>
    where
        S::Error: Display,
    {
        store.list_tasks(filter).map_err(store_err)
    }

    /// Backlog health snapshot
    pub fn backlog<S: FundingStore>(&self, store: &S, now: u64) -> Result<QueueMetrics, QueueError>
    where
        S::Error: Display,
    {
        let open = self.list(
            store,
            &TaskFilter {
                open_only: true,
                ..Default::default()
            },
        )?;
        Ok(QueueMetrics::from_tasks(&open, now))
    }

    /// Apply a compare-and-set transition, explaining a refusal
    fn apply<S: FundingStore>(
        &self,
        store: &mut S,
        task_id: TaskId,
        transition: &TaskTransition,
        action: &'static str,
    ) -> Result<VerificationTask, QueueError>
    where
        S::Error: Display,
    {
        let applied = store.transition_task(task_id, transition).map_err(store_err)?;
        let task = load(store, task_id)?;
        if !applied {
            warn!(task = %task_id, status = %task.status, action, "Transition refused");
            return Err(QueueError::InvalidTransition {
                task: task_id,
                from: task.status,
                action,
            });
        }
        Ok(task)
    }

    /// The value a verification commits, checked against the task kind
    fn verified_value<S: FundingStore>(
        &self,
        store: &S,
        task: &VerificationTask,
        chosen: Option<FactValue>,
    ) -> Result<FactValue, QueueError>
    where
        S::Error: Display,
    {
        let value = match (&task.subject, chosen) {
            (TaskSubject::Identity { provisional, .. }, Some(FactValue::Entity(id))) => {
                if id == *provisional {
                    return Err(QueueError::InvalidValue(
                        "an entity cannot be merged into itself".to_string(),
                    ));
                }
                let Some(target) = store.get_entity(id).map_err(store_err)? else {
                    return Err(QueueError::InvalidValue(format!("entity {} does not exist", id)));
                };
                let Some(source) = store.get_entity(*provisional).map_err(store_err)? else {
                    return Err(QueueError::InvalidValue(format!(
                        "entity {} does not exist",
                        provisional
                    )));
                };
                if target.kind != source.kind {
                    return Err(QueueError::InvalidValue(format!(
                        "{} {} cannot absorb {} {}",
                        target.kind, id, source.kind, provisional
                    )));
                }
                for entity in [&source, &target] {
                    if let Some(survivor) = entity.merged_into {
                        return Err(QueueError::InvalidValue(format!(
                            "entity {} is already merged into {}",
                            entity.id, survivor
                        )));
                    }
                }
                return Ok(FactValue::Entity(id));
            }
            (TaskSubject::Identity { .. }, Some(other)) => {
                return Err(QueueError::InvalidValue(format!(
                    "identity tasks take an entity, got {}",
                    other.type_name()
                )));
            }
            (TaskSubject::Identity { .. }, None) => {
                return Err(QueueError::MissingValue("the matching entity".to_string()));
            }
            (TaskSubject::Conflict { .. }, None) => {
                return Err(QueueError::MissingValue(format!("the value of {}", task.key)));
            }
            (_, Some(value)) => value,
            (TaskSubject::Claim { claim_id }, None) => store
                .get_claim(*claim_id)
                .map_err(store_err)?
                .map(|c| c.value)
                .ok_or_else(|| QueueError::MissingValue(format!("claim {} is gone", claim_id)))?,
        };

        if !fits_kind(task.key.field.value_kind(), &value) {
            return Err(QueueError::InvalidValue(format!(
                "{} does not take a {} value",
                task.key,
                value.type_name()
            )));
        }
        Ok(value)
    }

    /// Claims among `ids` whose value agrees with the chosen value
    fn agreeing_claims<S: FundingStore>(
        &self,
        store: &S,
        ids: &[ClaimId],
        value: &FactValue,
    ) -> Result<Vec<ClaimId>, QueueError>
    where
        S::Error: Display,
    {
        let mut agreeing = Vec::new();
        for id in ids {
            let Some(claim) = store.get_claim(*id).map_err(store_err)? else {
                continue;
            };
            if values_agree(&claim.value, value, self.policy.money_tolerance) {
                agreeing.push(*id);
            }
        }
        Ok(agreeing)
    }
}

fn commit_reviewed<S: FundingStore>(
    store: &mut S,
    task: &VerificationTask,
    value: FactValue,
    backing: Vec<ClaimId>,
    reviewer: Option<String>,
    notes: Option<String>,
    now: u64,
) -> Result<Option<FactRecord>, QueueError>
where
    S::Error: Display,
{
    let request = CommitRequest {
        entity_id: task.entity_id,
        key: task.key.clone(),
        value,
        provenance: Provenance::reviewed(task.id, backing, reviewer, notes),
        expected_revision: None,
        committed_at: now,
    };
    match commit(store, &request)? {
        CommitOutcome::Committed(record) => Ok(Some(record)),
        _ => Ok(None),
    }
}

fn close_conflict<S: FundingStore>(
    store: &mut S,
    conflict_id: ConflictId,
    now: u64,
) -> Result<Option<ConflictId>, QueueError>
where
    S::Error: Display,
{
    if store.resolve_conflict(conflict_id, now).map_err(store_err)? {
        info!(conflict = %conflict_id, "Conflict resolved");
        Ok(Some(conflict_id))
    } else {
        warn!(conflict = %conflict_id, "Conflict was already closed");
        Ok(None)
    }
}

fn load<S: FundingStore>(store: &S, task_id: TaskId) -> Result<VerificationTask, QueueError>
where
    S::Error: Display,
{
    store
        .get_task(task_id)
        .map_err(store_err)?
        .ok_or(QueueError::TaskNotFound(task_id))
}

fn load_conflict<S: FundingStore>(store: &S, id: ConflictId) -> Result<Conflict, QueueError>
where
    S::Error: Display,
{
    store
        .get_conflict(id)
        .map_err(store_err)?
        .ok_or_else(|| QueueError::Store(format!("conflict {} not found", id)))
}

fn store_err<E: Display>(e: E) -> QueueError {
    QueueError::Store(e.to_string())
}
