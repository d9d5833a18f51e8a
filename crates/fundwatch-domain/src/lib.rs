//! Fundwatch Domain Layer
//!
//! This crate contains the core domain model for funding-data reconciliation.
//! It defines the value objects, the confidence formula, and the trait
//! interfaces that the storage, resolution, reconciliation and queue layers
//! depend upon.
//!
//! ## Key Concepts
//!
//! - **FactClaim**: one source's assertion about one field of one entity
//! - **Entity**: a company or investor with aliases and a current-facts projection
//! - **Conflict**: an unresolved disagreement between live claims for one field
//! - **VerificationTask**: a unit of human review with priority and due date
//! - **Provenance**: which claims (or which review) backed a committed value
//!
//! ## Architecture
//!
//! - Pure domain logic only, no I/O
//! - Claims are append-only; current facts are a derived projection
//! - Store traits are implemented by infrastructure crates (fundwatch-store)

#![warn(missing_docs)]
#![warn(clippy::all)]

#[macro_use]
mod id;

pub mod claim;
pub mod clock;
pub mod confidence;
pub mod conflict;
pub mod entity;
pub mod field;
pub mod provenance;
pub mod task;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use claim::{ClaimId, EntityRef, FactClaim, SourceKind};
pub use confidence::{ConfidenceConfig, ReliabilityTier, SourceEvidence};
pub use conflict::{Conflict, ConflictId, ConflictStatus};
pub use entity::{CommittedFact, Entity, EntityId, EntityKind};
pub use field::{Field, FieldKey, ValueKind};
pub use provenance::{FactRecord, Provenance, ProvenanceKind};
pub use task::{
    AssigneeChange, Priority, SlaPolicy, TaskFilter, TaskId, TaskKind, TaskStatus, TaskSubject,
    TaskTransition, VerificationTask,
};
pub use traits::{
    ClaimStore, CommitOutcome, CommitRequest, ConflictStore, EntityStore, FundingStore,
    StoreBackend, TaskStore,
};
pub use value::{DatePrecision, FactValue, PartialDate};
