//! End-to-end tests for the Normalizer

use crate::{NormalizeError, Normalizer, NormalizerConfig, RawRecord, SourceMetadata, SourcedRecord};
use fundwatch_domain::{EntityKind, FactValue, Field, FieldKey, PartialDate, SourceKind};
use std::collections::BTreeSet;

const FETCHED: u64 = 1_700_000_000;
const NOW: u64 = 1_700_000_500;

fn parse(json: &str) -> RawRecord {
    serde_json::from_str(json).unwrap()
}

fn source(id: &str) -> SourceMetadata {
    SourceMetadata::new(id, FETCHED)
}

#[test]
fn test_news_article_round_facts() {
    let record = parse(
        r#"{
            "source_type": "news",
            "company": "CyberSecure Inc.",
            "headline": "CyberSecure raises $10M Series A",
            "url": "https://news.example/a",
            "published_at": "2024-03-05",
            "round_type": "Series A",
            "amount": "$10M",
            "lead_investor": "Acme Ventures",
            "investors": "Beta Capital, Gamma Partners and Acme Ventures"
        }"#,
    );

    let result = Normalizer::with_defaults()
        .normalize(&record, &source("news:techwire"), NOW)
        .unwrap();

    assert!(result.unknown_fields.is_empty());
    assert_eq!(result.claims.len(), 4);

    let amount = result
        .claims
        .iter()
        .find(|c| c.key == FieldKey::in_round(Field::RoundAmount, "series_a"))
        .unwrap();
    assert_eq!(amount.value, FactValue::usd(10_000_000));
    assert_eq!(amount.source_kind, SourceKind::News);
    assert_eq!(amount.entity_name(), Some("CyberSecure Inc."));
    assert_eq!(amount.evidence.as_deref(), Some("https://news.example/a"));
    assert_eq!(amount.ingested_at, NOW);
    // 2024-03-05T00:00:00Z
    assert_eq!(amount.observed_at, 1_709_596_800);

    let round_type = result.claims.iter().find(|c| c.field() == Field::RoundType).unwrap();
    assert_eq!(round_type.key, FieldKey::new(Field::RoundType));
    assert_eq!(round_type.value, FactValue::Enum("series_a".into()));

    let participants = result.claims.iter().find(|c| c.field() == Field::Participants).unwrap();
    match &participants.value {
        FactValue::TextSet(names) => assert_eq!(names.len(), 3),
        other => panic!("Expected a name set, got {:?}", other),
    }
}

#[test]
fn test_unknown_fields_dropped_not_coerced() {
    let record = parse(
        r#"{"source_type": "api", "name": "Acme", "total_funding": 15000000, "favorite_color": "blue"}"#,
    );
    let result = Normalizer::with_defaults().normalize(&record, &source("api:x"), NOW).unwrap();

    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.unknown_fields, vec!["favorite_color".to_string()]);
    for claim in &result.claims {
        assert!(Field::VOCABULARY.contains(&claim.field()));
    }
}

#[test]
fn test_money_spellings_normalize_identically() {
    let normalizer = Normalizer::with_defaults();
    let mut values = BTreeSet::new();
    for amount in [r#""$15M""#, r#""15,000,000""#, r#""USD 15 million""#, r#""$15.0m""#, "15000000"] {
        let json = format!(
            r#"{{"source_type": "api", "name": "Acme", "total_funding": {}}}"#,
            amount
        );
        let result = normalizer.normalize(&parse(&json), &source("api:x"), NOW).unwrap();
        values.insert(result.claims[0].value.as_money().unwrap());
    }
    assert_eq!(values.into_iter().collect::<Vec<_>>(), vec![1_500_000_000]);
}

#[test]
fn test_year_only_date_keeps_precision() {
    let record = parse(r#"{"source_type": "manual", "entity": "Acme", "founded": "2019"}"#);
    let result = Normalizer::with_defaults().normalize(&record, &source("manual:desk"), NOW).unwrap();

    assert_eq!(result.claims[0].value, FactValue::Date(PartialDate::year(2019)));
    assert_eq!(result.claims[0].source_kind, SourceKind::Manual);
}

#[test]
fn test_missing_event_date_falls_back_to_fetch_time() {
    let record = parse(r#"{"source_type": "api", "name": "Acme", "sector": "Cloud Security"}"#);
    let result = Normalizer::with_defaults().normalize(&record, &source("api:x"), NOW).unwrap();

    assert_eq!(result.claims[0].observed_at, FETCHED);
    assert_eq!(result.claims[0].value, FactValue::Enum("cloud_security".into()));
}

#[test]
fn test_missing_name_is_malformed() {
    let record = parse(r#"{"source_type": "news", "amount": "$5M"}"#);
    let err = Normalizer::with_defaults()
        .normalize(&record, &source("news:x"), NOW)
        .unwrap_err();
    assert!(matches!(err, NormalizeError::Malformed(_)));
}

#[test]
fn test_no_factual_field_is_malformed() {
    let record = parse(r#"{"source_type": "news", "company": "Acme", "mood": "upbeat"}"#);
    let err = Normalizer::with_defaults()
        .normalize(&record, &source("news:x"), NOW)
        .unwrap_err();
    assert!(matches!(err, NormalizeError::Malformed(_)));
}

#[test]
fn test_round_scoped_field_without_round_is_counted() {
    let record = parse(r#"{"source_type": "news", "company": "Acme", "amount": "$5M", "hq": "Austin"}"#);
    let result = Normalizer::with_defaults().normalize(&record, &source("news:x"), NOW).unwrap();

    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.unparseable_fields, vec!["amount".to_string()]);
}

#[test]
fn test_explicit_round_label_wins() {
    let record = parse(
        r#"{"source_type": "api", "name": "Acme", "round": "Seed", "round_type": "Series A", "amount": 2000000}"#,
    );
    let result = Normalizer::with_defaults().normalize(&record, &source("api:x"), NOW).unwrap();

    assert!(result
        .claims
        .iter()
        .any(|c| c.key == FieldKey::in_round(Field::RoundAmount, "seed")));
}

#[test]
fn test_investor_profile() {
    let record = parse(
        r#"{"source_type": "api", "name": "Acme Ventures", "entity_kind": "investor", "hq": "Austin,  TX"}"#,
    );
    let result = Normalizer::with_defaults().normalize(&record, &source("api:x"), NOW).unwrap();

    assert_eq!(result.claims[0].entity_kind, EntityKind::Investor);
    assert_eq!(result.claims[0].value, FactValue::Text("Austin, TX".into()));
}

#[test]
fn test_empty_strings_respect_config() {
    let record = parse(r#"{"source_type": "manual", "entity": "Acme", "description": "  "}"#);

    let strict = Normalizer::new(NormalizerConfig::strict()).unwrap();
    assert!(strict.normalize(&record, &source("manual:x"), NOW).unwrap().claims.is_empty());

    let lenient = Normalizer::new(NormalizerConfig::lenient()).unwrap();
    let result = lenient.normalize(&record, &source("manual:x"), NOW).unwrap();
    assert_eq!(result.claims[0].value, FactValue::Text(String::new()));
}

#[test]
fn test_invalid_config_rejected() {
    let config = NormalizerConfig { max_text_length: 0, ..Default::default() };
    assert!(matches!(Normalizer::new(config), Err(NormalizeError::Config(_))));
}

#[test]
fn test_batch_report_counts() {
    let batch: Vec<SourcedRecord> = serde_json::from_str(
        r#"[
            {"source": {"source_id": "api:x", "fetched_at": 1},
             "record": {"source_type": "api", "name": "Acme", "total_funding": "$1M", "color": "red"}},
            {"source": {"source_id": "news:y", "fetched_at": 2},
             "record": {"source_type": "news", "amount": "$5M"}},
            {"source": {"source_id": "news:y", "fetched_at": 3},
             "record": {"source_type": "news", "company": "Beta", "valuation": "lots", "color": "blue"}}
        ]"#,
    )
    .unwrap();

    let (claims, report) = Normalizer::with_defaults().normalize_batch(&batch, NOW);

    assert_eq!(claims.len(), 1);
    assert_eq!(report.records_seen, 3);
    assert_eq!(report.claims_emitted, 1);
    assert_eq!(report.unknown_fields.get("color"), Some(&2));
    assert_eq!(report.unparseable_values.get("valuation"), Some(&1));
    assert_eq!(report.malformed.len(), 1);
    assert_eq!(report.malformed[0].index, 1);
}
