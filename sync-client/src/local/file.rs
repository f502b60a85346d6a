//! File-backed local store.
//!
//! The whole local state (entities plus current user) is one JSON snapshot,
//! loaded on open and rewritten after every change.

use super::{LocalStore, LocalStoreError, UserContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use petsync_types::{Entity, EntityId, EntityKind, Syncable, User};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    user: Option<User>,
}

impl Snapshot {
    fn position(&self, kind: EntityKind, id: &EntityId) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.kind() == kind && e.entity_id() == id)
    }
}

/// Local store persisted to a single JSON file.
///
/// Changes reach memory only after the snapshot is written.
#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl FileLocalStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LocalStoreError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &Snapshot) -> Result<(), LocalStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn all(&self, kind: EntityKind) -> Result<Vec<Entity>, LocalStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .entities
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>, LocalStoreError> {
        let state = self.state.lock().await;
        Ok(state.position(kind, id).map(|i| state.entities[i].clone()))
    }

    async fn put(&self, entity: Entity) -> Result<(), LocalStoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        match next.position(entity.kind(), entity.entity_id()) {
            Some(i) => next.entities[i] = entity,
            None => next.entities.push(entity),
        }
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool, LocalStoreError> {
        let mut state = self.state.lock().await;
        let Some(i) = state.position(kind, id) else {
            return Ok(false);
        };
        let mut next = state.clone();
        next.entities.remove(i);
        self.persist(&next).await?;
        *state = next;
        Ok(true)
    }
}

#[async_trait]
impl UserContext for FileLocalStore {
    async fn current_user(&self) -> Result<Option<User>, LocalStoreError> {
        Ok(self.state.lock().await.user.clone())
    }

    async fn set_current_user(&self, user: User) -> Result<(), LocalStoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.user = Some(user);
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petsync_types::{Pet, RecordId, Shelter};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileLocalStore::open(dir.path().join("local.json")).await.unwrap();

        assert!(store.all(EntityKind::Pet).await.unwrap().is_empty());
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let user = User::new("Sam");
        {
            let store = FileLocalStore::open(&path).await.unwrap();
            let mut pet = Pet::new("p1", "Rex");
            pet.remote_id = Some(RecordId::new("rec-001"));
            store.put(pet.into()).await.unwrap();
            store.put(Shelter::new("s1", "Happy Tails").into()).await.unwrap();
            store.set_current_user(user.clone()).await.unwrap();
        }

        let store = FileLocalStore::open(&path).await.unwrap();
        let pets = store.all(EntityKind::Pet).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert!(pets[0].is_synced());
        assert_eq!(store.all(EntityKind::Shelter).await.unwrap().len(), 1);
        assert_eq!(store.current_user().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let dir = TempDir::new().unwrap();
        let store = FileLocalStore::open(dir.path().join("local.json")).await.unwrap();
        store.put(Pet::new("p1", "Rex").into()).await.unwrap();

        let id = EntityId::new("p1");
        assert!(store.delete(EntityKind::Pet, &id).await.unwrap());
        assert!(!store.delete(EntityKind::Pet, &id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.json");
        let store = FileLocalStore::open(&path).await.unwrap();
        store.put(Pet::new("p1", "Rex").into()).await.unwrap();

        // A directory where the temp file goes makes every write fail.
        tokio::fs::create_dir(path.with_extension("tmp")).await.unwrap();

        assert!(store.put(Pet::new("p2", "Luna").into()).await.is_err());
        assert!(store.delete(EntityKind::Pet, &EntityId::new("p1")).await.is_err());
        assert!(store.set_current_user(User::new("Sam")).await.is_err());

        let pets = store.all(EntityKind::Pet).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].entity_id().as_str(), "p1");
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_encoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let result = FileLocalStore::open(&path).await;
        assert!(matches!(result, Err(LocalStoreError::Encoding(_))));
    }
}
