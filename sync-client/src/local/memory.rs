//! In-memory local store.

use super::{LocalStore, LocalStoreError, UserContext};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use petsync_types::{Entity, EntityId, EntityKind, Syncable, User};

#[derive(Debug, Default)]
struct MemoryInner {
    entities: BTreeMap<(EntityKind, EntityId), Entity>,
    user: Option<User>,
}

/// Local store held in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryLocalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a current user already set.
    pub fn with_user(user: User) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().user = Some(user);
        store
    }

    /// Number of entities of every kind.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entities.len()
    }

    /// Whether the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn all(&self, kind: EntityKind) -> Result<Vec<Entity>, LocalStoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entities
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>, LocalStoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.entities.get(&(kind, id.clone())).cloned())
    }

    async fn put(&self, entity: Entity) -> Result<(), LocalStoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (entity.kind(), entity.entity_id().clone());
        inner.entities.insert(key, entity);
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool, LocalStoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.entities.remove(&(kind, id.clone())).is_some())
    }
}

#[async_trait]
impl UserContext for MemoryLocalStore {
    async fn current_user(&self) -> Result<Option<User>, LocalStoreError> {
        Ok(self.inner.lock().unwrap().user.clone())
    }

    async fn set_current_user(&self, user: User) -> Result<(), LocalStoreError> {
        self.inner.lock().unwrap().user = Some(user);
        Ok(())
    }
}
