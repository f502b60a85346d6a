//! # petsync-client
//!
//! Reconciliation between a device's local pets and shelters and a remote
//! record store.
//!
//! This is the main library that applications use to sync favorites.
//!
//! ## Features
//!
//! - **Favorites**: save or delete a favorite with a read-before-write guard
//!   against duplicate remote records
//! - **Full sync**: push unsynced entities, then pull new remote records,
//!   guarded so at most one pass runs at a time
//! - **Store abstraction**: pluggable remote store (file-backed, mock) and
//!   local store (file-backed, in-memory)
//! - **Pure State Machine**: Uses petsync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use petsync_client::{MemoryLocalStore, MockRecordStore, Reconciler, ReconcilerConfig};
//!
//! let reconciler = Reconciler::new(
//!     ReconcilerConfig::default(),
//!     MockRecordStore::new(),
//!     MemoryLocalStore::with_user(user),
//! );
//!
//! // Favorite a pet
//! reconciler.save_favorite(pet.into()).await?;
//!
//! // Push then pull
//! reconciler.perform_full_sync().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod local;
pub mod reconciler;
pub mod store;

pub use config::ReconcilerConfig;
pub use error::ReconcileError;
pub use local::{FileLocalStore, LocalStore, LocalStoreError, MemoryLocalStore, UserContext};
pub use reconciler::{Reconciler, SyncOutcome, SyncReport};
pub use store::{
    BatchOutcome, FileRecordStore, MockRecordStore, RecordStore, RemoteError, StoreCall,
};
