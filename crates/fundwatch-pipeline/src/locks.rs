//! Per-entity exclusive sections

use crate::PipelineError;
use fundwatch_domain::EntityId;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A mutex per entity id
///
/// Detection and commit for one entity must not interleave: two concurrent
/// claims could both see "no conflict". Different entities proceed in
/// parallel.
#[derive(Default)]
pub struct EntityLocks {
    slots: Mutex<HashMap<EntityId, Arc<AsyncMutex<()>>>>,
}

impl EntityLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one entity
    pub async fn lock(&self, entity: EntityId) -> Result<OwnedMutexGuard<()>, PipelineError> {
        let slot = self.slot(entity)?;
        Ok(slot.lock_owned().await)
    }

    /// Lock several entities in ascending id order
    pub async fn lock_all(
        &self,
        entities: impl IntoIterator<Item = EntityId>,
    ) -> Result<Vec<OwnedMutexGuard<()>>, PipelineError> {
        let ordered: BTreeSet<EntityId> = entities.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for entity in ordered {
            guards.push(self.lock(entity).await?);
        }
        Ok(guards)
    }

    /// Drop slots nobody holds or waits on
    pub fn prune(&self) -> Result<usize, PipelineError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| PipelineError::Lock(format!("Entity lock table error: {}", e)))?;
        let before = slots.len();
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Ok(before - slots.len())
    }

    /// Number of entities with a slot
    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether no entity has a slot
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, entity: EntityId) -> Result<Arc<AsyncMutex<()>>, PipelineError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| PipelineError::Lock(format!("Entity lock table error: {}", e)))?;
        Ok(Arc::clone(slots.entry(entity).or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_entity_is_exclusive() {
        let locks = Arc::new(EntityLocks::new());
        let entity = EntityId::new();

        let guard = locks.lock(entity).await.unwrap();
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.lock(entity).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_different_entities_do_not_block() {
        let locks = EntityLocks::new();
        let _a = locks.lock(EntityId::new()).await.unwrap();
        let _b = locks.lock(EntityId::new()).await.unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_slots() {
        let locks = EntityLocks::new();
        let held = locks.lock(EntityId::new()).await.unwrap();
        drop(locks.lock(EntityId::new()).await.unwrap());

        assert_eq!(locks.prune().unwrap(), 1);
        assert_eq!(locks.len(), 1);
        drop(held);
        assert_eq!(locks.prune().unwrap(), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_lock_all_dedups() {
        let locks = EntityLocks::new();
        let id = EntityId::new();
        let guards = locks.lock_all([id, id]).await.unwrap();
        assert_eq!(guards.len(), 1);
    }
}
