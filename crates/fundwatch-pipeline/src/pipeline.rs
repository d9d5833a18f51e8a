//! The ingest-to-review pipeline

use crate::{EntityLocks, IngestReport, PipelineConfig, PipelineError};
use fundwatch_domain::{
    Entity, EntityId, EntityKind, FactClaim, FactValue, Field, FieldKey, FundingStore, TaskFilter,
    TaskId, TaskKind, TaskSubject, ValueKind, VerificationTask,
};
use fundwatch_graph::{build, names_of, rounds_from_entities, Graph};
use fundwatch_normalizer::{Normalizer, SourcedRecord};
use fundwatch_queue::{QueueMetrics, ReviewOutcome, ReviewRequest, VerificationQueue};
use fundwatch_reconciler::{Decision, ReconcileError, Reconciler};
use fundwatch_resolver::{normalize_key, Candidate, EntityResolver, Resolution, ResolverError};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Wires normalizer, resolver, reconciler and queue around one shared store
///
/// Normalization fans out over blocking worker threads. Resolution runs
/// under one pipeline-wide section so two first sightings of near-identical
/// names cannot both create an entity. Detection and commit run under a
/// per-entity lock.
pub struct Pipeline<S> {
    store: Arc<Mutex<S>>,
    normalizer: Arc<Normalizer>,
    resolver: EntityResolver,
    reconciler: Reconciler,
    queue: VerificationQueue,
    locks: EntityLocks,
    resolve_gate: AsyncMutex<()>,
}

impl<S> Pipeline<S>
where
    S: FundingStore + Send + 'static,
    S::Error: Display,
{
    /// Create a pipeline over a shared store
    pub fn new(store: Arc<Mutex<S>>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        let reconciler = Reconciler::new(config.reconcile.clone(), config.queue.sla)?;
        let queue = VerificationQueue::new(config.queue)?.with_policy(config.reconcile);

        Ok(Self {
            store,
            normalizer: Arc::new(Normalizer::new(config.normalizer)?),
            resolver: EntityResolver::new(config.resolver)?,
            reconciler,
            queue,
            locks: EntityLocks::new(),
            resolve_gate: AsyncMutex::new(()),
        })
    }

    /// Create a pipeline with default configuration
    pub fn with_defaults(store: Arc<Mutex<S>>) -> Self {
        Self {
            store,
            normalizer: Arc::new(Normalizer::with_defaults()),
            resolver: EntityResolver::with_defaults(),
            reconciler: Reconciler::with_defaults(),
            queue: VerificationQueue::default_config(),
            locks: EntityLocks::new(),
            resolve_gate: AsyncMutex::new(()),
        }
    }

    /// The shared store
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// The verification queue
    pub fn queue(&self) -> &VerificationQueue {
        &self.queue
    }

    /// The per-entity lock table
    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }

    /// Normalize, resolve and reconcile a batch of raw records
    ///
    /// Malformed records are counted and skipped. Claims are stored and
    /// reconciled in batch order.
    pub async fn ingest(
        &self,
        batch: Vec<SourcedRecord>,
        now: u64,
    ) -> Result<IngestReport, PipelineError> {
        let handles: Vec<_> = batch
            .into_iter()
            .map(|item| {
                let normalizer = Arc::clone(&self.normalizer);
                tokio::task::spawn_blocking(move || {
                    let outcome = normalizer.normalize(&item.record, &item.source, now);
                    (item.source, outcome)
                })
            })
            .collect();

        let mut report = IngestReport::default();
        let mut claims = Vec::new();
        for (index, handle) in handles.into_iter().enumerate() {
            let (source, outcome) = handle.await?;
            claims.extend(report.normalize.record(index, &source, outcome));
        }

        for claim in claims {
            match self.ingest_claim(claim, now, &mut report).await {
                Ok(()) => {}
                Err(PipelineError::Resolve(ResolverError::EmptyName(name))) => {
                    warn!(name = %name, "Skipping claim with an unusable name");
                    report.claims_skipped += 1;
                }
                Err(e) => {
                    self.locks.prune()?;
                    return Err(e);
                }
            }
        }
        self.locks.prune()?;

        info!(
            records = report.normalize.records_seen,
            claims = report.claims_stored,
            committed = report.committed,
            conflicts = report.conflicts_opened,
            tasks = report.tasks_created.len(),
            "Ingest complete"
        );
        Ok(report)
    }

    /// Store one normalized claim and reconcile its key
    async fn ingest_claim(
        &self,
        mut claim: FactClaim,
        now: u64,
        report: &mut IngestReport,
    ) -> Result<(), PipelineError> {
        let entity_id = {
            let _gate = self.resolve_gate.lock().await;
            let mut store = self.lock_store()?;

            let entity_id = match claim.entity_name().map(str::to_string) {
                Some(name) => {
                    let resolution =
                        self.resolver.resolve(&mut *store, &name, claim.entity_kind, now)?;
                    report.record_resolution(&resolution);
                    self.flag_ambiguity(&mut *store, &name, &resolution, now, report)?;
                    resolution.entity_id()
                }
                None => claim.entity_id().ok_or_else(|| {
                    PipelineError::Store(format!("claim {} names no entity", claim.id))
                })?,
            };

            claim.value = self.resolve_investors(&mut *store, claim.key.field, claim.value, now, report)?;
            entity_id
        };
        let claim = claim.resolved_to(entity_id);

        let _entity = self.locks.lock(entity_id).await?;
        let decision = {
            let mut store = self.lock_store()?;
            store.append_claim(&claim).map_err(store_err)?;
            report.claims_stored += 1;
            self.reconcile_key(&mut *store, entity_id, &claim.key, now)
        };
        match decision {
            Ok(decision) => {
                report.record_decision(&decision);
                debug!(entity = %entity_id, key = %claim.key, ?decision, "Claim reconciled");
            }
            // The claim is stored; the next claim for the key reconciles it
            Err(e) => {
                warn!(entity = %entity_id, key = %claim.key, error = %e, "Claim stored but not reconciled");
                report.unreconciled += 1;
            }
        }
        Ok(())
    }

    /// Reconcile one key, re-reading once if the revision moved underneath
    fn reconcile_key(
        &self,
        store: &mut S,
        entity: EntityId,
        key: &FieldKey,
        now: u64,
    ) -> Result<Decision, ReconcileError> {
        match self.reconciler.reconcile(store, entity, key, now) {
            Err(ReconcileError::StaleCommit { expected, actual }) => {
                debug!(entity = %entity, key = %key, expected, actual, "Stale commit, retrying");
                self.reconciler.reconcile(store, entity, key, now)
            }
            other => other,
        }
    }

    /// Replace investor names with resolved entities
    fn resolve_investors(
        &self,
        store: &mut S,
        field: Field,
        value: FactValue,
        now: u64,
        report: &mut IngestReport,
    ) -> Result<FactValue, PipelineError> {
        match (field.value_kind(), value) {
            (ValueKind::InvestorRef, FactValue::Text(name)) => {
                let id = self.resolve_investor(store, &name, now, report)?;
                Ok(FactValue::Entity(id))
            }
            (ValueKind::InvestorSet, FactValue::TextSet(names)) => {
                let mut ids = BTreeSet::new();
                for name in &names {
                    ids.insert(self.resolve_investor(store, name, now, report)?);
                }
                Ok(FactValue::EntitySet(ids))
            }
            (_, value) => Ok(value),
        }
    }

    fn resolve_investor(
        &self,
        store: &mut S,
        name: &str,
        now: u64,
        report: &mut IngestReport,
    ) -> Result<EntityId, PipelineError> {
        let resolution = self.resolver.resolve(store, name, EntityKind::Investor, now)?;
        report.record_resolution(&resolution);
        self.flag_ambiguity(store, name, &resolution, now, report)?;
        Ok(resolution.entity_id())
    }

    /// Open a low-confidence task on the identity field of a provisional entity
    fn flag_ambiguity(
        &self,
        store: &mut S,
        name: &str,
        resolution: &Resolution,
        now: u64,
        report: &mut IngestReport,
    ) -> Result<(), PipelineError> {
        let Resolution::Ambiguous { provisional, candidates } = resolution else {
            return Ok(());
        };
        let key = FieldKey::new(Field::Identity);
        if store
            .open_task_for(*provisional, &key, TaskKind::LowConfidence)
            .map_err(store_err)?
            .is_some()
        {
            return Ok(());
        }

        let priority = Field::Identity.review_priority();
        let task = VerificationTask::new(
            TaskKind::LowConfidence,
            TaskSubject::Identity {
                name: name.to_string(),
                provisional: *provisional,
                candidates: candidates.iter().map(|c: &Candidate| c.entity_id).collect(),
            },
            *provisional,
            key,
            priority,
            now,
            self.reconciler.sla().due_at(priority, now),
        );
        store.insert_task(&task).map_err(store_err)?;
        info!(task = %task.id, name, candidates = candidates.len(), "Created identity task");
        report.tasks_created.push(task.id);
        Ok(())
    }

    /// Re-evaluate every key of an entity
    pub async fn reconcile_entity(
        &self,
        entity: EntityId,
        now: u64,
    ) -> Result<Vec<(FieldKey, Decision)>, PipelineError> {
        let guard = self.locks.lock(entity).await?;
        let decisions = self
            .lock_store()
            .and_then(|mut store| self.reconcile_all(&mut store, entity, now));
        drop(guard);
        self.locks.prune()?;
        decisions
    }

    fn reconcile_all(
        &self,
        store: &mut S,
        entity: EntityId,
        now: u64,
    ) -> Result<Vec<(FieldKey, Decision)>, PipelineError> {
        let keys = store.field_keys(entity).map_err(store_err)?;
        let mut decisions = Vec::with_capacity(keys.len());
        for key in keys {
            let decision = self.reconcile_key(store, entity, &key, now)?;
            decisions.push((key, decision));
        }
        Ok(decisions)
    }

    /// Take a pending task for review
    pub fn claim_task(&self, task_id: TaskId, assignee: &str) -> Result<VerificationTask, PipelineError> {
        let mut store = self.lock_store()?;
        Ok(self.queue.claim(&mut *store, task_id, assignee)?)
    }

    /// Hand a task back to the pending pool
    pub fn release_task(&self, task_id: TaskId) -> Result<VerificationTask, PipelineError> {
        let mut store = self.lock_store()?;
        Ok(self.queue.release(&mut *store, task_id)?)
    }

    /// Close a task and apply its side effects
    ///
    /// When an identity review merges a provisional entity, every key of the
    /// survivor is reconciled again so the merged claims take part.
    pub async fn resolve_task(
        &self,
        task_id: TaskId,
        request: ReviewRequest,
        now: u64,
    ) -> Result<ReviewOutcome, PipelineError> {
        let task = {
            let store = self.lock_store()?;
            store
                .get_task(task_id)
                .map_err(store_err)?
                .ok_or(fundwatch_queue::QueueError::TaskNotFound(task_id))?
        };

        let mut involved = vec![task.entity_id];
        if let (TaskSubject::Identity { .. }, Some(FactValue::Entity(target))) =
            (&task.subject, &request.chosen_value)
        {
            involved.push(*target);
        }
        let guards = self.locks.lock_all(involved).await?;
        let outcome = self.resolve_locked(task_id, request, now);
        drop(guards);
        self.locks.prune()?;
        outcome
    }

    fn resolve_locked(
        &self,
        task_id: TaskId,
        request: ReviewRequest,
        now: u64,
    ) -> Result<ReviewOutcome, PipelineError> {
        let mut store = self.lock_store()?;
        let outcome = self.queue.resolve(&mut *store, task_id, request, now)?;
        if let Some((from, into)) = outcome.merged {
            let decisions = self.reconcile_all(&mut store, into, now)?;
            info!(from = %from, into = %into, keys = decisions.len(), "Survivor reconciled after merge");
        }
        Ok(outcome)
    }

    /// Tasks matching a filter
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<VerificationTask>, PipelineError> {
        let store = self.lock_store()?;
        Ok(self.queue.list(&*store, filter)?)
    }

    /// Open tasks past their deadline
    pub fn overdue(&self, now: u64) -> Result<Vec<VerificationTask>, PipelineError> {
        let store = self.lock_store()?;
        Ok(self.queue.overdue(&*store, now)?)
    }

    /// Backlog health snapshot
    pub fn backlog(&self, now: u64) -> Result<QueueMetrics, PipelineError> {
        let store = self.lock_store()?;
        Ok(self.queue.backlog(&*store, now)?)
    }

    /// Look an entity up by name, following merges
    pub fn find_entity(&self, name: &str, kind: EntityKind) -> Result<Option<Entity>, PipelineError> {
        let store = self.lock_store()?;
        let key = normalize_key(name);
        let found = match store.find_by_key(kind, &key).map_err(store_err)? {
            Some(entity) => Some(entity),
            None => store.find_by_alias(kind, name.trim()).map_err(store_err)?,
        };
        match found {
            Some(entity) => Ok(Some(self.resolver.survivor(&*store, entity)?)),
            None => Ok(None),
        }
    }

    /// Build a co-investment graph from the committed facts
    ///
    /// The entity snapshot is copied under the store lock; the build itself
    /// runs without it and may be cancelled through `cancel`.
    pub async fn build_graph(
        &self,
        built_at: u64,
        cancel: Arc<AtomicBool>,
    ) -> Result<Graph, PipelineError> {
        let entities = {
            let store = self.lock_store()?;
            let mut entities = store.list_entities(EntityKind::Company).map_err(store_err)?;
            entities.extend(store.list_entities(EntityKind::Investor).map_err(store_err)?);
            entities
        };
        debug!(entities = entities.len(), "Graph snapshot taken");

        let graph = tokio::task::spawn_blocking(move || {
            let rounds = rounds_from_entities(&entities);
            build(&rounds, &names_of(&entities), built_at, &cancel)
        })
        .await??;
        Ok(graph)
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, S>, PipelineError> {
        self.store
            .lock()
            .map_err(|e| PipelineError::Lock(format!("Store lock error: {}", e)))
    }
}

fn store_err<E: Display>(e: E) -> PipelineError {
    PipelineError::Store(e.to_string())
}
