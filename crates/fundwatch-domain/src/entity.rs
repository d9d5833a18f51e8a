//! Entities (companies and investors) and their current-facts projection

use crate::{FactValue, FieldKey, Provenance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

uuid_id! {
    /// Stable identifier for a company or investor
    EntityId
}

/// Whether an entity is a company or an investor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A funded company
    Company,
    /// A fund, firm or angel
    Investor,
}

impl EntityKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Investor => "investor",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "company" => Some(EntityKind::Company),
            "investor" => Some(EntityKind::Investor),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The committed value of one field together with what backed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedFact {
    /// Authoritative value
    pub value: FactValue,
    /// Monotonic revision, starting at 1 for the first commit
    pub revision: u64,
    /// Provenance of the latest commit
    pub provenance: Provenance,
    /// When the latest commit happened
    pub committed_at: u64,
}

/// A company or investor
///
/// Entities are never hard-deleted. A duplicate is soft-merged by pointing
/// `merged_into` at the survivor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier
    pub id: EntityId,
    /// Company or investor
    pub kind: EntityKind,
    /// Name as first seen
    pub display_name: String,
    /// Normalized matching key
    pub canonical_key: String,
    /// Every raw spelling seen for this entity
    pub aliases: BTreeSet<String>,
    /// Survivor this entity was merged into, if any
    pub merged_into: Option<EntityId>,
    /// Creation time
    pub created_at: u64,
    /// Current committed value per field
    #[serde(with = "fact_map")]
    pub current_facts: BTreeMap<FieldKey, CommittedFact>,
}

// JSON object keys must be strings, so the map travels as a list of pairs.
mod fact_map {
    use super::{CommittedFact, FieldKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<FieldKey, CommittedFact>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&FieldKey, &CommittedFact)> = map.iter().collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<FieldKey, CommittedFact>, D::Error> {
        let pairs = Vec::<(FieldKey, CommittedFact)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl Entity {
    /// Create a new entity from its first sighting
    pub fn new(
        kind: EntityKind,
        display_name: impl Into<String>,
        canonical_key: impl Into<String>,
        created_at: u64,
    ) -> Self {
        let display_name = display_name.into();
        let mut aliases = BTreeSet::new();
        aliases.insert(display_name.clone());
        Self {
            id: EntityId::new(),
            kind,
            display_name,
            canonical_key: canonical_key.into(),
            aliases,
            merged_into: None,
            created_at,
            current_facts: BTreeMap::new(),
        }
    }

    /// Whether this entity has been merged into another
    pub fn is_merged(&self) -> bool {
        self.merged_into.is_some()
    }

    /// Current value of a field, if committed
    pub fn fact(&self, key: &FieldKey) -> Option<&FactValue> {
        self.current_facts.get(key).map(|f| &f.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn test_new_entity_has_display_alias() {
        let entity = Entity::new(EntityKind::Investor, "Acme Ventures", "acme ventures", 10);
        assert!(entity.aliases.contains("Acme Ventures"));
        assert!(!entity.is_merged());
        assert!(entity.fact(&FieldKey::new(Field::Headquarters)).is_none());
    }

    #[test]
    fn test_entity_json_round_trip() {
        let mut entity = Entity::new(EntityKind::Company, "CyberSecure Inc.", "cybersecure", 10);
        entity.current_facts.insert(
            FieldKey::new(Field::TotalFunding),
            CommittedFact {
                value: FactValue::usd(10_000_000),
                revision: 1,
                provenance: Provenance::auto_accepted([]),
                committed_at: 20,
            },
        );

        let json = serde_json::to_string(&entity).unwrap();
        let parsed: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entity);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(EntityKind::parse("Investor"), Some(EntityKind::Investor));
        assert_eq!(EntityKind::parse("fund"), None);
    }
}
