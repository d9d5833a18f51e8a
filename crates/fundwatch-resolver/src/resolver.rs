//! Entity resolution against the entity store

use crate::key::{normalize_key, similarity};
use crate::{ResolverConfig, ResolverError};
use fundwatch_domain::{Entity, EntityId, EntityKind, EntityStore};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// How a name was matched to an existing entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Normalized key equal to the entity's canonical key
    Exact,
    /// Raw name previously recorded as an alias
    Alias,
    /// Similarity above the floor with a clear winner
    Fuzzy,
}

/// A possible match for an ambiguous name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate entity
    pub entity_id: EntityId,
    /// Candidate's canonical key
    pub canonical_key: String,
    /// Candidate's display name
    pub display_name: String,
    /// Similarity to the resolved name
    pub score: f64,
}

/// Outcome of resolving one raw name
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The name belongs to an existing entity
    Matched {
        /// Matched entity (always a survivor, never a merged entity)
        entity_id: EntityId,
        /// Which rule matched
        via: MatchKind,
        /// Similarity score (1.0 for exact and alias matches)
        score: f64,
    },
    /// No entity came close, so a new one was created
    Created {
        /// The new entity
        entity_id: EntityId,
    },
    /// Several entities scored too close to call
    ///
    /// A provisional entity was created so ingestion can proceed; an
    /// identity review decides whether it merges into one of the candidates.
    Ambiguous {
        /// Provisional entity created for the name
        provisional: EntityId,
        /// Contending entities, best first
        candidates: Vec<Candidate>,
    },
}

impl Resolution {
    /// The entity claims about this name should be attributed to
    pub fn entity_id(&self) -> EntityId {
        match self {
            Resolution::Matched { entity_id, .. } | Resolution::Created { entity_id } => *entity_id,
            Resolution::Ambiguous { provisional, .. } => *provisional,
        }
    }

    /// Whether the resolution needs an identity review
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous { .. })
    }
}

/// Resolves raw company and investor names to stable entities
///
/// Matching runs in a fixed order: exact key, alias, fuzzy. The same name
/// against the same entity set always yields the same entity.
pub struct EntityResolver {
    config: ResolverConfig,
}

impl EntityResolver {
    /// Create a resolver with the given configuration
    pub fn new(config: ResolverConfig) -> Result<Self, ResolverError> {
        config.validate().map_err(ResolverError::Config)?;
        Ok(Self { config })
    }

    /// Create a resolver with default configuration
    pub fn with_defaults() -> Self {
        Self { config: ResolverConfig::default() }
    }

    /// Get the resolver configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a raw name to an entity, creating one when nothing matches
    ///
    /// Every matched raw name that is not yet an alias is recorded as one.
    pub fn resolve<S: EntityStore>(
        &self,
        store: &mut S,
        name: &str,
        kind: EntityKind,
        now: u64,
    ) -> Result<Resolution, ResolverError>
    where
        S::Error: Display,
    {
        let raw = name.trim();
        let key = normalize_key(raw);
        if key.is_empty() {
            return Err(ResolverError::EmptyName(name.to_string()));
        }

        // 1. Exact key
        if let Some(entity) = store.find_by_key(kind, &key).map_err(store_err)? {
            let survivor = self.survivor(store, entity)?;
            self.record_alias(store, survivor.id, raw)?;
            debug!(name = raw, entity = %survivor.id, "Exact key match");
            return Ok(Resolution::Matched {
                entity_id: survivor.id,
                via: MatchKind::Exact,
                score: 1.0,
            });
        }

        // 2. Alias table
        if let Some(entity) = store.find_by_alias(kind, raw).map_err(store_err)? {
            let survivor = self.survivor(store, entity)?;
            self.record_alias(store, survivor.id, raw)?;
            debug!(name = raw, entity = %survivor.id, "Alias match");
            return Ok(Resolution::Matched {
                entity_id: survivor.id,
                via: MatchKind::Alias,
                score: 1.0,
            });
        }

        // 3. Fuzzy
        let candidates = self.fuzzy_candidates(store, kind, &key)?;
        let Some(top) = candidates.first() else {
            let entity = Entity::new(kind, raw, key, now);
            store.create_entity(&entity).map_err(store_err)?;
            info!(name = raw, kind = %kind, entity = %entity.id, "Created entity");
            return Ok(Resolution::Created { entity_id: entity.id });
        };

        let contenders: Vec<Candidate> = candidates
            .iter()
            .take_while(|c| top.score - c.score <= self.config.ambiguity_margin)
            .cloned()
            .collect();

        if contenders.len() == 1 {
            let entity_id = top.entity_id;
            let score = top.score;
            self.record_alias(store, entity_id, raw)?;
            debug!(name = raw, entity = %entity_id, score, "Fuzzy match");
            return Ok(Resolution::Matched { entity_id, via: MatchKind::Fuzzy, score });
        }

        let provisional = Entity::new(kind, raw, key, now);
        store.create_entity(&provisional).map_err(store_err)?;
        warn!(
            name = raw,
            provisional = %provisional.id,
            candidates = contenders.len(),
            "Ambiguous name; created provisional entity"
        );
        Ok(Resolution::Ambiguous {
            provisional: provisional.id,
            candidates: contenders,
        })
    }

    /// Follow merge pointers to the surviving entity
    pub fn survivor<S: EntityStore>(&self, store: &S, entity: Entity) -> Result<Entity, ResolverError>
    where
        S::Error: Display,
    {
        let start = entity.id;
        let mut current = entity;
        for _ in 0..self.config.max_merge_depth {
            let Some(next) = current.merged_into else {
                return Ok(current);
            };
            current = store
                .get_entity(next)
                .map_err(store_err)?
                .ok_or(ResolverError::NotFound(next))?;
        }
        if current.merged_into.is_none() {
            return Ok(current);
        }
        Err(ResolverError::MergeCycle(start))
    }

    /// Score every live entity of a kind, keeping those above the floor
    ///
    /// Ordered by score descending, then canonical key, then id.
    fn fuzzy_candidates<S: EntityStore>(
        &self,
        store: &S,
        kind: EntityKind,
        key: &str,
    ) -> Result<Vec<Candidate>, ResolverError>
    where
        S::Error: Display,
    {
        let mut candidates: Vec<Candidate> = store
            .list_entities(kind)
            .map_err(store_err)?
            .into_iter()
            .filter(|e| !e.is_merged())
            .filter_map(|e| {
                let score = similarity(key, &e.canonical_key);
                (score >= self.config.similarity_floor).then(|| Candidate {
                    entity_id: e.id,
                    canonical_key: e.canonical_key,
                    display_name: e.display_name,
                    score,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.canonical_key.cmp(&b.canonical_key))
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        Ok(candidates)
    }

    fn record_alias<S: EntityStore>(
        &self,
        store: &mut S,
        id: EntityId,
        raw: &str,
    ) -> Result<(), ResolverError>
    where
        S::Error: Display,
    {
        if store.append_alias(id, raw).map_err(store_err)? {
            debug!(entity = %id, alias = raw, "Recorded alias");
        }
        Ok(())
    }
}

fn store_err<E: Display>(e: E) -> ResolverError {
    ResolverError::Store(e.to_string())
}

