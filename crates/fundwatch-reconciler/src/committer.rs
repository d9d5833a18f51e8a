//! The single write path for current facts

use crate::comparator::fits_kind;
use crate::ReconcileError;
use fundwatch_domain::{CommitOutcome, CommitRequest, EntityStore};
use std::fmt::Display;
use tracing::{debug, info};

/// Commit a value to an entity's field
///
/// Appends a history entry and advances the current value in one store
/// transaction. Committing the same value with the same provenance again is
/// a no-op reported as [`CommitOutcome::Unchanged`]. A mismatched
/// `expected_revision` fails with [`ReconcileError::StaleCommit`] and writes
/// nothing.
pub fn commit<S: EntityStore>(
    store: &mut S,
    request: &CommitRequest,
) -> Result<CommitOutcome, ReconcileError>
where
    S::Error: Display,
{
    if !fits_kind(request.key.field.value_kind(), &request.value) {
        return Err(ReconcileError::ValueKind {
            key: request.key.clone(),
            found: request.value.type_name(),
        });
    }

    let outcome = store
        .commit_fact(request)
        .map_err(|e| ReconcileError::Store(e.to_string()))?;

    match &outcome {
        CommitOutcome::Committed(record) => {
            info!(
                entity = %record.entity_id,
                key = %record.key,
                revision = record.revision,
                value = %record.value,
                provenance = ?record.provenance.kind,
                "Committed fact"
            );
        }
        CommitOutcome::Unchanged { revision } => {
            debug!(
                entity = %request.entity_id,
                key = %request.key,
                revision,
                "Commit already applied"
            );
        }
        CommitOutcome::Stale { expected, actual } => {
            return Err(ReconcileError::StaleCommit {
                expected: *expected,
                actual: *actual,
            });
        }
    }

    Ok(outcome)
}
