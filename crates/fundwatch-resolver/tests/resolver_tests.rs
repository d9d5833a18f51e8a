//! Resolver tests against the SQLite store

use fundwatch_domain::{Entity, EntityKind, EntityStore};
use fundwatch_resolver::{EntityResolver, MatchKind, Resolution, ResolverConfig, ResolverError};
use fundwatch_store::SqliteStore;
use std::collections::BTreeSet;

const NOW: u64 = 1_700_000_000;

fn store() -> SqliteStore {
    SqliteStore::new(":memory:").unwrap()
}

fn seed(store: &mut SqliteStore, name: &str, key: &str) -> Entity {
    let entity = Entity::new(EntityKind::Company, name, key, NOW);
    store.create_entity(&entity).unwrap();
    entity
}

#[test]
fn test_spellings_resolve_to_one_entity_in_any_order() {
    let names = ["Acme Inc.", "ACME, Inc", "Acme"];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let resolver = EntityResolver::with_defaults();

    for order in orders {
        let mut store = store();
        let ids: BTreeSet<_> = order
            .iter()
            .map(|&i| {
                resolver
                    .resolve(&mut store, names[i], EntityKind::Company, NOW)
                    .unwrap()
                    .entity_id()
            })
            .collect();
        assert_eq!(ids.len(), 1, "order {:?} produced several entities", order);

        let entities = store.list_entities(EntityKind::Company).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].canonical_key, "acme");
        let expected: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
        assert_eq!(entities[0].aliases, expected);
    }
}

#[test]
fn test_first_sighting_creates_entity() {
    let mut store = store();
    let resolver = EntityResolver::with_defaults();

    let first = resolver
        .resolve(&mut store, "Zenith Robotics", EntityKind::Company, NOW)
        .unwrap();
    assert!(matches!(first, Resolution::Created { .. }));

    let again = resolver
        .resolve(&mut store, "Zenith Robotics", EntityKind::Company, NOW)
        .unwrap();
    assert_eq!(
        again,
        Resolution::Matched { entity_id: first.entity_id(), via: MatchKind::Exact, score: 1.0 }
    );
}

#[test]
fn test_kinds_do_not_mix() {
    let mut store = store();
    let resolver = EntityResolver::with_defaults();

    let company = resolver.resolve(&mut store, "Acme", EntityKind::Company, NOW).unwrap();
    let investor = resolver.resolve(&mut store, "Acme", EntityKind::Investor, NOW).unwrap();
    assert!(matches!(investor, Resolution::Created { .. }));
    assert_ne!(company.entity_id(), investor.entity_id());
}

#[test]
fn test_fuzzy_match_records_alias() {
    let mut store = store();
    let cyber = seed(&mut store, "CyberSecure", "cybersecure");
    let resolver = EntityResolver::with_defaults();

    let resolution = resolver
        .resolve(&mut store, "Cyber Secure Inc", EntityKind::Company, NOW)
        .unwrap();
    match resolution {
        Resolution::Matched { entity_id, via, score } => {
            assert_eq!(entity_id, cyber.id);
            assert_eq!(via, MatchKind::Fuzzy);
            assert!(score >= 0.85);
        }
        other => panic!("Expected a fuzzy match, got {:?}", other),
    }

    // The spelling is now an alias
    let again = resolver
        .resolve(&mut store, "Cyber Secure Inc", EntityKind::Company, NOW)
        .unwrap();
    assert!(matches!(again, Resolution::Matched { via: MatchKind::Alias, .. }));
    let stored = store.get_entity(cyber.id).unwrap().unwrap();
    assert!(stored.aliases.contains("Cyber Secure Inc"));
}

#[test]
fn test_close_tie_is_ambiguous() {
    let mut store = store();
    let labs = seed(&mut store, "Acme Labs", "acme labs");
    let labo = seed(&mut store, "Acme Labo", "acme labo");
    let resolver = EntityResolver::with_defaults();

    let resolution = resolver
        .resolve(&mut store, "Acme Lab", EntityKind::Company, NOW)
        .unwrap();

    let Resolution::Ambiguous { provisional, candidates } = resolution else {
        panic!("Expected an ambiguous resolution");
    };
    assert_ne!(provisional, labs.id);
    assert_ne!(provisional, labo.id);
    // Equal scores fall back to canonical key order
    let keys: Vec<_> = candidates.iter().map(|c| c.canonical_key.as_str()).collect();
    assert_eq!(keys, vec!["acme labo", "acme labs"]);

    // The provisional entity now owns the name
    let next = resolver
        .resolve(&mut store, "Acme Lab", EntityKind::Company, NOW)
        .unwrap();
    assert_eq!(
        next,
        Resolution::Matched { entity_id: provisional, via: MatchKind::Exact, score: 1.0 }
    );
}

#[test]
fn test_strict_floor_creates_instead_of_matching() {
    let mut store = store();
    let cyber = seed(&mut store, "CyberSecure", "cybersecure");
    let resolver = EntityResolver::new(ResolverConfig::strict()).unwrap();

    let resolution = resolver
        .resolve(&mut store, "Cyber Secur", EntityKind::Company, NOW)
        .unwrap();
    assert!(matches!(resolution, Resolution::Created { .. }));
    assert_ne!(resolution.entity_id(), cyber.id);
}

#[test]
fn test_merged_entity_resolves_to_survivor() {
    let mut store = store();
    let survivor = seed(&mut store, "Beta Capital", "beta capital");
    let duplicate = seed(&mut store, "Beta Cap", "beta cap");
    store.merge_entities(duplicate.id, survivor.id).unwrap();

    let resolver = EntityResolver::with_defaults();
    let resolution = resolver
        .resolve(&mut store, "Beta Cap", EntityKind::Company, NOW)
        .unwrap();
    assert_eq!(resolution.entity_id(), survivor.id);
}

#[test]
fn test_empty_name_rejected() {
    let mut store = store();
    let resolver = EntityResolver::with_defaults();
    let err = resolver
        .resolve(&mut store, " .,", EntityKind::Company, NOW)
        .unwrap_err();
    assert!(matches!(err, ResolverError::EmptyName(_)));
}

#[test]
fn test_invalid_config_rejected() {
    let config = ResolverConfig { ambiguity_margin: 1.5, ..Default::default() };
    assert!(matches!(EntityResolver::new(config), Err(ResolverError::Config(_))));
}
