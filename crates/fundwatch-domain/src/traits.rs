//! Trait definitions for persistence
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates (fundwatch-store).
//! All four stores share one error type through [`StoreBackend`] so that a
//! single backend can implement every one of them.

use crate::{
    ClaimId, CommittedFact, Conflict, ConflictId, Entity, EntityId, EntityKind, FactClaim,
    FactRecord, FactValue, FieldKey, Provenance, TaskFilter, TaskId, TaskKind, TaskTransition,
    VerificationTask,
};
use std::collections::BTreeSet;

/// Common error type shared by every store trait
pub trait StoreBackend {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;
}

/// A request to advance the current value of one field
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    /// Entity the fact belongs to
    pub entity_id: EntityId,
    /// Field key
    pub key: FieldKey,
    /// Value to commit
    pub value: FactValue,
    /// What backs the value
    pub provenance: Provenance,
    /// Revision the caller last saw (`Some(0)` means "no value yet")
    pub expected_revision: Option<u64>,
    /// Commit time
    pub committed_at: u64,
}

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// A new history entry was appended and the current value advanced
    Committed(FactRecord),
    /// An identical (value, provenance) entry already exists; nothing written
    Unchanged {
        /// Current revision of the field
        revision: u64,
    },
    /// The caller's expected revision did not match; nothing written
    Stale {
        /// Revision the caller expected
        expected: u64,
        /// Revision actually stored
        actual: u64,
    },
}

/// Trait for storing entities and their committed facts
///
/// Implemented by the infrastructure layer (fundwatch-store)
pub trait EntityStore: StoreBackend {
    /// Get an entity by ID (merged entities are returned as stored)
    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error>;

    /// Find an entity by normalized canonical key
    fn find_by_key(&self, kind: EntityKind, key: &str) -> Result<Option<Entity>, Self::Error>;

    /// Find an entity that has recorded `alias` as a raw spelling
    fn find_by_alias(&self, kind: EntityKind, alias: &str) -> Result<Option<Entity>, Self::Error>;

    /// List every entity of a kind, including merged ones, ordered by id
    fn list_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, Self::Error>;

    /// Insert a new entity
    fn create_entity(&mut self, entity: &Entity) -> Result<(), Self::Error>;

    /// Record a raw spelling for an entity; returns false if already known
    fn append_alias(&mut self, id: EntityId, alias: &str) -> Result<bool, Self::Error>;

    /// Soft-merge `from` into `into`
    ///
    /// Sets `merged_into`, copies aliases to the survivor and re-points any
    /// entity previously merged into `from`. Both entities must be of the
    /// same kind and neither may be merged already.
    fn merge_entities(&mut self, from: EntityId, into: EntityId) -> Result<(), Self::Error>;

    /// Atomically append a history entry and advance the current value
    fn commit_fact(&mut self, request: &CommitRequest) -> Result<CommitOutcome, Self::Error>;

    /// Current committed value of a field
    fn current_fact(
        &self,
        id: EntityId,
        key: &FieldKey,
    ) -> Result<Option<CommittedFact>, Self::Error>;

    /// Full commit history of a field, oldest first
    fn fact_history(&self, id: EntityId, key: &FieldKey) -> Result<Vec<FactRecord>, Self::Error>;
}

/// Trait for the append-only claim log
///
/// Claims of a merged entity are read as claims of its survivor.
pub trait ClaimStore: StoreBackend {
    /// Append a resolved claim
    fn append_claim(&mut self, claim: &FactClaim) -> Result<(), Self::Error>;

    /// Get a claim by ID
    fn get_claim(&self, id: ClaimId) -> Result<Option<FactClaim>, Self::Error>;

    /// Every claim about one field of an entity (and of entities merged into it)
    fn claims_for(&self, entity: EntityId, key: &FieldKey) -> Result<Vec<FactClaim>, Self::Error>;

    /// Distinct field keys with at least one claim for an entity
    fn field_keys(&self, entity: EntityId) -> Result<Vec<FieldKey>, Self::Error>;
}

/// Trait for conflict bookkeeping
pub trait ConflictStore: StoreBackend {
    /// The open conflict for (entity, key), if any
    fn open_conflict_for(
        &self,
        entity: EntityId,
        key: &FieldKey,
    ) -> Result<Option<Conflict>, Self::Error>;

    /// Insert a newly detected conflict
    fn insert_conflict(&mut self, conflict: &Conflict) -> Result<(), Self::Error>;

    /// Add contending claims to an existing conflict
    fn attach_claims(&mut self, id: ConflictId, claims: &[ClaimId]) -> Result<(), Self::Error>;

    /// Close an open conflict; returns false if it was not open
    fn resolve_conflict(&mut self, id: ConflictId, resolved_at: u64) -> Result<bool, Self::Error>;

    /// Get a conflict by ID
    fn get_conflict(&self, id: ConflictId) -> Result<Option<Conflict>, Self::Error>;

    /// Claims that took part in a resolved conflict for (entity, key)
    fn adjudicated_claims(
        &self,
        entity: EntityId,
        key: &FieldKey,
    ) -> Result<BTreeSet<ClaimId>, Self::Error>;
}

/// Trait for verification task persistence
pub trait TaskStore: StoreBackend {
    /// Insert a new task
    fn insert_task(&mut self, task: &VerificationTask) -> Result<(), Self::Error>;

    /// Get a task by ID
    fn get_task(&self, id: TaskId) -> Result<Option<VerificationTask>, Self::Error>;

    /// The open (pending or in-review) task of a kind for (entity, key)
    fn open_task_for(
        &self,
        entity: EntityId,
        key: &FieldKey,
        kind: TaskKind,
    ) -> Result<Option<VerificationTask>, Self::Error>;

    /// Compare-and-set transition
    ///
    /// Applies `transition` only if the task's current status is one of
    /// `transition.expected`. Returns false when the task is missing or in
    /// another state; nothing is written in that case.
    fn transition_task(
        &mut self,
        id: TaskId,
        transition: &TaskTransition,
    ) -> Result<bool, Self::Error>;

    /// Query tasks, ordered by (due_at, priority, created_at)
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<VerificationTask>, Self::Error>;
}

/// Everything the reconciliation core needs from persistence
pub trait FundingStore: EntityStore + ClaimStore + ConflictStore + TaskStore {}

impl<T> FundingStore for T where T: EntityStore + ClaimStore + ConflictStore + TaskStore {}
