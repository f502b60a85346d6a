//! Local entity persistence.
//!
//! The reconciler reads and writes device-local state through two traits:
//! [`LocalStore`] for Pets and Shelters, and [`UserContext`] for the
//! signed-in user. [`MemoryLocalStore`] backs tests; [`FileLocalStore`]
//! backs the CLI.

mod file;
mod memory;

pub use file::FileLocalStore;
pub use memory::MemoryLocalStore;

use async_trait::async_trait;
use thiserror::Error;

use petsync_types::{Entity, EntityId, EntityKind, RecordId, Syncable, User};

/// Local persistence errors.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored state could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Device-local store of syncable entities.
///
/// Entities are keyed by kind and [`EntityId`]; `put` replaces any entity of
/// the same kind and id.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// All entities of a kind.
    async fn all(&self, kind: EntityKind) -> Result<Vec<Entity>, LocalStoreError>;

    /// One entity by id.
    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>, LocalStoreError>;

    /// Insert or replace an entity.
    async fn put(&self, entity: Entity) -> Result<(), LocalStoreError>;

    /// Remove an entity. Returns `true` if it existed.
    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool, LocalStoreError>;

    /// Entities of a kind not yet saved remotely.
    async fn unsynced(&self, kind: EntityKind) -> Result<Vec<Entity>, LocalStoreError> {
        let all = self.all(kind).await?;
        Ok(all.into_iter().filter(|e| !e.is_synced()).collect())
    }

    /// Remote ids of every synced entity of a kind.
    async fn synced_ids(&self, kind: EntityKind) -> Result<Vec<RecordId>, LocalStoreError> {
        let all = self.all(kind).await?;
        Ok(all
            .into_iter()
            .filter_map(|e| e.remote_id().cloned())
            .collect())
    }
}

/// Access to the signed-in user.
#[async_trait]
pub trait UserContext: Send + Sync {
    /// The current user, if one has been set up.
    async fn current_user(&self) -> Result<Option<User>, LocalStoreError>;

    /// Replace the current user.
    async fn set_current_user(&self, user: User) -> Result<(), LocalStoreError>;
}
