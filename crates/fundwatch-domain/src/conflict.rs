//! Conflicts - unresolved disagreement between live claims

use crate::{ClaimId, EntityId, FieldKey};
use serde::{Deserialize, Serialize};

uuid_id! {
    /// Identifier for a detected conflict
    ConflictId
}

/// Lifecycle of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStatus {
    /// Awaiting review
    Open,
    /// Closed by a verified or rejected review
    Resolved,
}

impl ConflictStatus {
    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStatus::Open => "open",
            ConflictStatus::Resolved => "resolved",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ConflictStatus::Open),
            "resolved" => Some(ConflictStatus::Resolved),
            _ => None,
        }
    }
}

/// A disagreement for one (entity, field key)
///
/// At most one conflict per (entity, field key) is open at a time; later
/// disagreeing claims attach to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Identifier
    pub id: ConflictId,
    /// Entity in dispute
    pub entity_id: EntityId,
    /// Field in dispute
    pub key: FieldKey,
    /// Claims taking part, sorted
    pub contending_claims: Vec<ClaimId>,
    /// Detection time
    pub detected_at: u64,
    /// Open or resolved
    pub status: ConflictStatus,
    /// When it was closed
    pub resolved_at: Option<u64>,
}

impl Conflict {
    /// Open a new conflict
    pub fn open(
        entity_id: EntityId,
        key: FieldKey,
        claims: impl IntoIterator<Item = ClaimId>,
        detected_at: u64,
    ) -> Self {
        let mut contending_claims: Vec<ClaimId> = claims.into_iter().collect();
        contending_claims.sort();
        contending_claims.dedup();
        Self {
            id: ConflictId::new(),
            entity_id,
            key,
            contending_claims,
            detected_at,
            status: ConflictStatus::Open,
            resolved_at: None,
        }
    }

    /// A conflict record that is closed from the start
    ///
    /// Records a reviewer's verdict on claims that never contended, so
    /// they count as adjudicated like any other reviewed claims.
    pub fn settled(
        entity_id: EntityId,
        key: FieldKey,
        claims: impl IntoIterator<Item = ClaimId>,
        at: u64,
    ) -> Self {
        let mut conflict = Self::open(entity_id, key, claims, at);
        conflict.status = ConflictStatus::Resolved;
        conflict.resolved_at = Some(at);
        conflict
    }

    /// Whether the conflict is still awaiting review
    pub fn is_open(&self) -> bool {
        self.status == ConflictStatus::Open
    }

    /// Claims not yet attached to this conflict
    pub fn missing_claims<'a>(&self, claims: impl IntoIterator<Item = &'a ClaimId>) -> Vec<ClaimId> {
        claims
            .into_iter()
            .filter(|id| self.contending_claims.binary_search(id).is_err())
            .copied()
            .collect()
    }
}
