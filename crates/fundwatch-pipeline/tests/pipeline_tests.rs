//! End-to-end pipeline tests against an in-memory store

use fundwatch_domain::{
    ClaimStore, Entity, EntityKind, EntityStore, FactClaim, FactValue, Field, FieldKey,
    ProvenanceKind, SourceKind, TaskFilter, TaskKind, TaskStatus, TaskSubject,
};
use fundwatch_graph::{EdgeKind, GraphError};
use fundwatch_normalizer::SourcedRecord;
use fundwatch_pipeline::{Pipeline, PipelineConfig, PipelineError};
use fundwatch_queue::ReviewRequest;
use fundwatch_resolver::normalize_key;
use fundwatch_store::SqliteStore;
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

const NOW: u64 = 1_700_000_000;

fn pipeline() -> Pipeline<SqliteStore> {
    let store = SqliteStore::new(":memory:").unwrap();
    Pipeline::new(Arc::new(Mutex::new(store)), PipelineConfig::default()).unwrap()
}

fn api(source: &str, record: serde_json::Value) -> SourcedRecord {
    let mut record = record;
    record["source_type"] = json!("api");
    serde_json::from_value(json!({
        "source": { "source_id": source, "fetched_at": NOW },
        "record": record,
    }))
    .unwrap()
}

fn funding() -> FieldKey {
    FieldKey::new(Field::TotalFunding)
}

fn open_tasks(pipeline: &Pipeline<SqliteStore>) -> Vec<fundwatch_domain::VerificationTask> {
    pipeline
        .list_tasks(&TaskFilter { open_only: true, ..Default::default() })
        .unwrap()
}

#[tokio::test]
async fn test_agreeing_sources_commit_without_review() {
    let pipeline = pipeline();
    let batch = vec![
        api("api:alpha", json!({ "name": "CyberSecure Inc.", "total_funding": "$10M" })),
        api("api:beta", json!({ "name": "CyberSecure, Inc", "total_funding": "$10.2M" })),
    ];

    let report = pipeline.ingest(batch, NOW).await.unwrap();
    assert_eq!(report.claims_stored, 2);
    assert_eq!(report.entities_created, 1);
    assert_eq!(report.entities_matched, 1);
    assert!(!report.needs_review());

    let entity = pipeline.find_entity("CyberSecure", EntityKind::Company).unwrap().unwrap();
    assert_eq!(entity.fact(&funding()), Some(&FactValue::usd(10_000_000)));
    assert!(open_tasks(&pipeline).is_empty());
    assert!(pipeline.locks().is_empty());
}

#[tokio::test]
async fn test_conflict_reviewed_end_to_end() {
    let pipeline = pipeline();
    let batch = vec![
        api("api:alpha", json!({ "name": "CyberSecure Inc.", "total_funding": 10_000_000 })),
        api("api:beta", json!({ "name": "CyberSecure Inc.", "total_funding": 12_000_000 })),
    ];
    let report = pipeline.ingest(batch, NOW).await.unwrap();
    assert_eq!(report.conflicts_opened, 1);
    assert_eq!(report.tasks_created.len(), 1);

    let task_id = report.tasks_created[0];
    pipeline.claim_task(task_id, "ana").unwrap();
    let outcome = pipeline
        .resolve_task(
            task_id,
            ReviewRequest::verify(Some(FactValue::usd(10_000_000))).with_notes("confirmed via SEC filing"),
            NOW + 60,
        )
        .await
        .unwrap();
    assert_eq!(outcome.task.status, TaskStatus::Verified);
    assert_eq!(outcome.committed.unwrap().provenance.kind, ProvenanceKind::Reviewed);

    let entity = pipeline.find_entity("CyberSecure Inc.", EntityKind::Company).unwrap().unwrap();
    assert_eq!(entity.fact(&funding()), Some(&FactValue::usd(10_000_000)));
    assert!(matches!(
        pipeline.claim_task(task_id, "bo"),
        Err(PipelineError::Queue(fundwatch_queue::QueueError::InvalidTransition { .. }))
    ));
}

#[tokio::test]
async fn test_malformed_records_are_counted_and_skipped() {
    let pipeline = pipeline();
    let batch = vec![
        api("api:alpha", json!({ "total_funding": "$1M" })),
        api("api:alpha", json!({ "name": "Zenith Robotics", "sector": "Robotics" })),
    ];
    let report = pipeline.ingest(batch, NOW).await.unwrap();
    assert_eq!(report.normalize.records_seen, 2);
    assert_eq!(report.normalize.malformed.len(), 1);
    assert_eq!(report.normalize.malformed[0].index, 0);
    assert_eq!(report.claims_stored, 1);
    assert_eq!(report.committed, 1);
}

#[tokio::test]
async fn test_investors_resolved_and_graph_built() {
    let pipeline = pipeline();
    let round = |company: &str, extra: serde_json::Value| {
        let mut record = json!({
            "name": company,
            "round": "Series A",
            "lead_investor": "Acme Ventures",
            "amount": "$5M",
        });
        if let (Some(map), Some(more)) = (record.as_object_mut(), extra.as_object()) {
            map.extend(more.clone());
        }
        api("api:alpha", record)
    };
    let batch = vec![
        round("Orbital Robotics", json!({ "participants": ["Northwind Capital"] })),
        round("Helix Health", json!({})),
        round("Quartz Data", json!({})),
    ];
    let report = pipeline.ingest(batch, NOW).await.unwrap();
    assert!(!report.needs_review());

    let acme = pipeline.find_entity("Acme Ventures", EntityKind::Investor).unwrap().unwrap();
    let northwind = pipeline.find_entity("Northwind Capital", EntityKind::Investor).unwrap().unwrap();
    let orbital = pipeline.find_entity("Orbital Robotics", EntityKind::Company).unwrap().unwrap();
    assert_eq!(
        orbital.fact(&FieldKey::in_round(Field::LeadInvestor, "series_a")),
        Some(&FactValue::Entity(acme.id))
    );

    let graph = pipeline.build_graph(NOW, Arc::new(AtomicBool::new(false))).await.unwrap();
    assert_eq!(graph.edges_of(EdgeKind::InvestorCompany).filter(|e| e.a == acme.id).count(), 3);
    let pair = graph.edge(EdgeKind::InvestorInvestor, acme.id, northwind.id).unwrap();
    assert_eq!(pair.co_occurrence_count, 1);
    assert_eq!(pair.total_amount, FactValue::usd(5_000_000).as_money().unwrap());

    let again = pipeline.build_graph(NOW, Arc::new(AtomicBool::new(false))).await.unwrap();
    assert_eq!(graph.to_json().unwrap(), again.to_json().unwrap());

    let cancelled = pipeline.build_graph(NOW, Arc::new(AtomicBool::new(true))).await;
    assert!(matches!(cancelled, Err(PipelineError::Graph(GraphError::Cancelled { .. }))));
}

#[tokio::test]
async fn test_identity_review_merges_and_reconciles_survivor() {
    let pipeline = pipeline();
    let labs = Entity::new(EntityKind::Company, "Acme Labs", "acme labs", NOW);
    let labo = Entity::new(EntityKind::Company, "Acme Labo", "acme labo", NOW);
    {
        let mut store = pipeline.store().lock().unwrap();
        store.create_entity(&labs).unwrap();
        store.create_entity(&labo).unwrap();
    }

    let report = pipeline
        .ingest(vec![api("api:alpha", json!({ "name": "Acme Lab", "total_funding": "$3M" }))], NOW)
        .await
        .unwrap();
    assert_eq!(report.ambiguous_names, 1);
    assert_eq!(report.tasks_created.len(), 1);

    let task = open_tasks(&pipeline).into_iter().next().unwrap();
    assert_eq!(task.kind, TaskKind::LowConfidence);
    assert_eq!(task.key, FieldKey::new(Field::Identity));
    let weak = pipeline
        .list_tasks(&TaskFilter { kind: Some(TaskKind::LowConfidence), ..Default::default() })
        .unwrap();
    assert_eq!(weak.len(), 1);
    let TaskSubject::Identity { provisional, candidates, .. } = task.subject.clone() else {
        panic!("Expected an identity subject");
    };
    assert_eq!(candidates.len(), 2);

    let outcome = pipeline
        .resolve_task(task.id, ReviewRequest::verify(Some(FactValue::Entity(labs.id))), NOW)
        .await
        .unwrap();
    assert_eq!(outcome.merged, Some((provisional, labs.id)));

    let survivor = pipeline.find_entity("Acme Lab", EntityKind::Company).unwrap().unwrap();
    assert_eq!(survivor.id, labs.id);
    assert_eq!(survivor.fact(&funding()), Some(&FactValue::usd(3_000_000)));
    assert!(pipeline.locks().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_ingest_opens_one_conflict() {
    let pipeline = Arc::new(pipeline());

    let first = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let batch = vec![api("api:alpha", json!({ "name": "CyberSecure Inc.", "total_funding": "$10M" }))];
            pipeline.ingest(batch, NOW).await
        })
    };
    let second = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let batch = vec![api("news:wire", json!({ "name": "CyberSecure Inc.", "total_funding": "$12M" }))];
            pipeline.ingest(batch, NOW).await
        })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let companies = pipeline.store().lock().unwrap().list_entities(EntityKind::Company).unwrap();
    assert_eq!(companies.len(), 1);

    let tasks = open_tasks(&pipeline);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind, TaskKind::Conflict);
    assert!(pipeline.locks().is_empty());
}

#[tokio::test]
async fn test_unreconcilable_key_does_not_stop_the_batch() {
    let pipeline = pipeline();
    let company = Entity::new(EntityKind::Company, "CyberSecure Inc.", normalize_key("CyberSecure Inc."), NOW);
    {
        // A newer claim from the same source carrying a value the field cannot hold
        let bad = FactClaim::new(
            EntityKind::Company,
            "CyberSecure Inc.",
            funding(),
            FactValue::Text("lots".into()),
            "api:alpha",
            SourceKind::Api,
            NOW + 100,
            NOW,
        )
        .resolved_to(company.id);
        let mut store = pipeline.store().lock().unwrap();
        store.create_entity(&company).unwrap();
        store.append_claim(&bad).unwrap();
    }

    let batch = vec![
        api("api:alpha", json!({ "name": "CyberSecure Inc.", "total_funding": "$10M" })),
        api("api:alpha", json!({ "name": "Helix Health", "total_funding": "$5M" })),
    ];
    let report = pipeline.ingest(batch, NOW).await.unwrap();
    assert_eq!(report.claims_stored, 2);
    assert_eq!(report.unreconciled, 1);
    assert_eq!(report.committed, 1);

    let helix = pipeline.find_entity("Helix Health", EntityKind::Company).unwrap().unwrap();
    assert_eq!(helix.fact(&funding()), Some(&FactValue::usd(5_000_000)));
    assert!(pipeline.locks().is_empty());
}
