//! Remote record store abstraction for petsync.
//!
//! This module provides a typed facade over a generic remote key-record
//! service (query-by-predicate, save, delete, batch operations). It surfaces
//! raw outcomes only: no retries, no interpretation. Retry and
//! reconciliation policy live in the [`Reconciler`](crate::Reconciler).
//!
//! # Design
//!
//! Batch operations have two levels of result:
//! - the outer `Result` is the overall completion of the request
//! - the inner `Vec` holds one outcome per submitted record, in input order
//!
//! # Example
//!
//! ```ignore
//! let store = MockRecordStore::new();
//! let saved = store.save(pet.to_record()?).await?;
//! let found = store.query(&Query::new(RecordType::Pet, Predicate::All)).await?;
//! ```

mod file;
mod mock;

pub use file::FileRecordStore;
pub use mock::{MockRecordStore, StoreCall};

use async_trait::async_trait;
use thiserror::Error;

use petsync_types::{Query, RecordId, RemoteRecord};

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Store unreachable.
    #[error("network error: {0}")]
    Network(String),

    /// No signed-in account for the store.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Store refused or failed the request.
    #[error("server error: {0}")]
    Server(String),

    /// No record with this id exists.
    #[error("unknown record: {0}")]
    UnknownRecord(RecordId),

    /// Operation needs a record id and the record has none.
    #[error("record has no id")]
    MissingRecordId,

    /// Backing storage failed (I/O, encoding).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Per-record outcomes of a batch request, in input order.
pub type BatchOutcome = Vec<Result<RemoteRecord, RemoteError>>;

/// Remote record store used by the reconciler.
///
/// Implementations talk to the actual service (or fake one).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch records matching the query.
    async fn query(&self, query: &Query) -> Result<Vec<RemoteRecord>, RemoteError>;

    /// Save one record. Returns it with its store-assigned id.
    ///
    /// A record that already carries an id overwrites the stored one.
    async fn save(&self, record: RemoteRecord) -> Result<RemoteRecord, RemoteError>;

    /// Save many records in one request.
    async fn batch_save(&self, records: Vec<RemoteRecord>) -> Result<BatchOutcome, RemoteError>;

    /// Delete a record by id.
    async fn delete(&self, record_id: &RecordId) -> Result<(), RemoteError>;

    /// Replace existing records in one request. Each record must carry the
    /// id of a stored record.
    async fn batch_modify(&self, records: Vec<RemoteRecord>)
        -> Result<BatchOutcome, RemoteError>;
}
