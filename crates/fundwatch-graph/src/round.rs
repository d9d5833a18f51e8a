//! Funding rounds derived from committed facts

use fundwatch_domain::{Entity, EntityId, EntityKind, FactValue, Field};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Merge chains longer than this are treated as broken
const MAX_MERGE_HOPS: usize = 16;

/// One funding round of one company, as committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRound {
    /// Company that raised
    pub company: EntityId,
    /// Round label (e.g. `series_a`)
    pub round: String,
    /// Committed round amount in minor units
    pub amount: Option<i64>,
    /// Lead plus participants, after merges
    pub investors: BTreeSet<EntityId>,
}

/// Collect funding rounds from a snapshot of entities
///
/// Reads the round-scoped `lead_investor`, `participants` and `round_amount`
/// facts of every company. Investors merged into another entity are counted
/// as their survivor; merged companies are skipped. Investor names that were
/// never resolved to entities are ignored.
pub fn rounds_from_entities(entities: &[Entity]) -> Vec<FundingRound> {
    let merged: BTreeMap<EntityId, EntityId> = entities
        .iter()
        .filter_map(|e| e.merged_into.map(|into| (e.id, into)))
        .collect();

    let mut rounds: BTreeMap<(EntityId, String), FundingRound> = BTreeMap::new();
    for company in entities
        .iter()
        .filter(|e| e.kind == EntityKind::Company && !e.is_merged())
    {
        for (key, fact) in &company.current_facts {
            let Some(label) = key.round.as_ref() else {
                continue;
            };
            let round = rounds
                .entry((company.id, label.clone()))
                .or_insert_with(|| FundingRound {
                    company: company.id,
                    round: label.clone(),
                    amount: None,
                    investors: BTreeSet::new(),
                });

            match (key.field, &fact.value) {
                (Field::RoundAmount, FactValue::Money(amount)) => round.amount = Some(*amount),
                (Field::LeadInvestor, value) | (Field::Participants, value) => {
                    round
                        .investors
                        .extend(value.entity_ids().into_iter().map(|id| survivor(&merged, id)));
                }
                _ => {}
            }
        }
    }

    rounds.into_values().collect()
}

/// Display names of live entities, keyed by id
pub fn names_of(entities: &[Entity]) -> BTreeMap<EntityId, (EntityKind, String)> {
    entities
        .iter()
        .filter(|e| !e.is_merged())
        .map(|e| (e.id, (e.kind, e.display_name.clone())))
        .collect()
}

fn survivor(merged: &BTreeMap<EntityId, EntityId>, mut id: EntityId) -> EntityId {
    for _ in 0..MAX_MERGE_HOPS {
        match merged.get(&id) {
            Some(next) => id = *next,
            None => break,
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwatch_domain::{ClaimId, CommittedFact, FieldKey, Provenance};

    fn fact(value: FactValue) -> CommittedFact {
        CommittedFact {
            value,
            revision: 1,
            provenance: Provenance::auto_accepted(Vec::<ClaimId>::new()),
            committed_at: 0,
        }
    }

    #[test]
    fn test_rounds_collect_lead_and_participants() {
        let lead = Entity::new(EntityKind::Investor, "Acme Ventures", "acme ventures", 0);
        let other = Entity::new(EntityKind::Investor, "Beta Capital", "beta capital", 0);
        let mut company = Entity::new(EntityKind::Company, "Gamma", "gamma", 0);
        company.current_facts.insert(
            FieldKey::in_round(Field::LeadInvestor, "series_a"),
            fact(FactValue::Entity(lead.id)),
        );
        company.current_facts.insert(
            FieldKey::in_round(Field::Participants, "series_a"),
            fact(FactValue::EntitySet([other.id].into_iter().collect())),
        );
        company.current_facts.insert(
            FieldKey::in_round(Field::RoundAmount, "series_a"),
            fact(FactValue::usd(5_000_000)),
        );
        company
            .current_facts
            .insert(FieldKey::new(Field::TotalFunding), fact(FactValue::usd(9_000_000)));

        let rounds = rounds_from_entities(&[company.clone(), lead.clone(), other.clone()]);
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].company, company.id);
        assert_eq!(rounds[0].round, "series_a");
        assert_eq!(rounds[0].amount, Some(500_000_000));
        assert_eq!(rounds[0].investors, [lead.id, other.id].into_iter().collect());
    }

    #[test]
    fn test_merged_investor_counts_as_survivor() {
        let survivor = Entity::new(EntityKind::Investor, "Acme Ventures", "acme ventures", 0);
        let mut duplicate = Entity::new(EntityKind::Investor, "Acme Vent.", "acme vent", 0);
        duplicate.merged_into = Some(survivor.id);
        let mut company = Entity::new(EntityKind::Company, "Gamma", "gamma", 0);
        company.current_facts.insert(
            FieldKey::in_round(Field::LeadInvestor, "seed"),
            fact(FactValue::Entity(duplicate.id)),
        );

        let entities = [company, survivor.clone(), duplicate];
        let rounds = rounds_from_entities(&entities);
        assert_eq!(rounds[0].investors, [survivor.id].into_iter().collect());
        assert!(!names_of(&entities).contains_key(&entities[2].id));
    }

    #[test]
    fn test_unresolved_names_ignored() {
        let mut company = Entity::new(EntityKind::Company, "Gamma", "gamma", 0);
        company.current_facts.insert(
            FieldKey::in_round(Field::LeadInvestor, "seed"),
            fact(FactValue::Text("Someone".into())),
        );
        let rounds = rounds_from_entities(&[company]);
        assert_eq!(rounds.len(), 1);
        assert!(rounds[0].investors.is_empty());
    }
}
