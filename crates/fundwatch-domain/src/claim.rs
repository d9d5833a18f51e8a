//! Claim module - one source's assertion about one field of one entity

use crate::{EntityId, EntityKind, Field, FieldKey, FactValue};
use serde::{Deserialize, Serialize};
use std::fmt;

uuid_id! {
    /// Unique identifier for a claim based on UUIDv7
    ///
    /// # Examples
    ///
    /// ```
    /// use fundwatch_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// let parsed = ClaimId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    ClaimId
}

/// Kind of producer a claim came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Facts extracted from a news article
    News,
    /// Facts from a structured data API
    Api,
    /// Facts typed in by an analyst
    Manual,
}

impl SourceKind {
    /// Get the source kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::Api => "api",
            SourceKind::Manual => "manual",
        }
    }

    /// Parse a source kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "news" => Some(SourceKind::News),
            "api" => Some(SourceKind::Api),
            "manual" => Some(SourceKind::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a claim is about
///
/// Claims leave the normalizer carrying the raw name and are rewritten to an
/// id by the resolver before they are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntityRef {
    /// Raw name as the source spelled it
    Name(String),
    /// Resolved entity identity
    Id(EntityId),
}

/// A claim - one source's assertion about one field of one entity
///
/// Claims are immutable once stored; a newer claim from the same source
/// supersedes an older one instead of editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactClaim {
    /// Unique identifier
    pub id: ClaimId,

    /// Company or investor
    pub entity_kind: EntityKind,

    /// Subject of the claim
    pub entity: EntityRef,

    /// Field and optional round scope
    pub key: FieldKey,

    /// Asserted value
    pub value: FactValue,

    /// Identifier of the producing source (e.g. "api:crunchbase", "news:techwire")
    pub source_id: String,

    /// Kind of the producing source
    pub source_kind: SourceKind,

    /// When the underlying event happened (announcement date)
    pub observed_at: u64,

    /// When the claim entered the system
    pub ingested_at: u64,

    /// Opaque evidence reference (URL, snippet)
    pub evidence: Option<String>,
}

impl FactClaim {
    /// Create a new claim about a named entity
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity_kind: EntityKind,
        entity_name: impl Into<String>,
        key: FieldKey,
        value: FactValue,
        source_id: impl Into<String>,
        source_kind: SourceKind,
        observed_at: u64,
        ingested_at: u64,
    ) -> Self {
        Self {
            id: ClaimId::new(),
            entity_kind,
            entity: EntityRef::Name(entity_name.into()),
            key,
            value,
            source_id: source_id.into(),
            source_kind,
            observed_at,
            ingested_at,
            evidence: None,
        }
    }

    /// Attach an evidence reference
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// The field this claim is about
    pub fn field(&self) -> Field {
        self.key.field
    }

    /// Resolved entity id, if the claim has been through the resolver
    pub fn entity_id(&self) -> Option<EntityId> {
        match &self.entity {
            EntityRef::Id(id) => Some(*id),
            EntityRef::Name(_) => None,
        }
    }

    /// Raw entity name, if the claim has not been resolved yet
    pub fn entity_name(&self) -> Option<&str> {
        match &self.entity {
            EntityRef::Name(name) => Some(name),
            EntityRef::Id(_) => None,
        }
    }

    /// Rewrite the subject to a resolved entity
    pub fn resolved_to(mut self, entity_id: EntityId) -> Self {
        self.entity = EntityRef::Id(entity_id);
        self
    }

    /// Ordering used to pick the live claim per source: newer event first,
    /// then later ingestion, then higher id
    pub fn recency_key(&self) -> (u64, u64, ClaimId) {
        (self.observed_at, self.ingested_at, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> FactClaim {
        FactClaim::new(
            EntityKind::Company,
            "CyberSecure Inc.",
            FieldKey::new(Field::TotalFunding),
            FactValue::usd(10_000_000),
            "api:alpha",
            SourceKind::Api,
            1_000,
            2_000,
        )
    }

    #[test]
    fn test_claim_id_ordering() {
        let id1 = ClaimId::from_value(1000);
        let id2 = ClaimId::from_value(2000);

        assert!(id1 < id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_claim_id_chronological() {
        let id1 = ClaimId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = ClaimId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should be less than later UUIDv7");
        assert!(id1.timestamp() <= id2.timestamp());
    }

    #[test]
    fn test_claim_id_invalid_string() {
        assert!(ClaimId::from_string("not-a-valid-uuid").is_err());
        assert!(ClaimId::from_string("").is_err());
    }

    #[test]
    fn test_resolution_rewrites_subject() {
        let claim = claim();
        assert_eq!(claim.entity_name(), Some("CyberSecure Inc."));
        assert_eq!(claim.entity_id(), None);

        let id = EntityId::new();
        let resolved = claim.resolved_to(id);
        assert_eq!(resolved.entity_id(), Some(id));
        assert_eq!(resolved.entity_name(), None);
    }

    #[test]
    fn test_claim_json_round_trip() {
        let claim = claim().with_evidence("https://example.com/a");
        let json = serde_json::to_string(&claim).unwrap();
        let parsed: FactClaim = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, claim);
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!(SourceKind::parse("NEWS"), Some(SourceKind::News));
        assert_eq!(SourceKind::parse("rss"), None);
    }
}
