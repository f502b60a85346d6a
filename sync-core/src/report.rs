//! Outcome reports for push and pull.
//!
//! Batch operations report per-record results. A push where the store
//! accepted some records and refused others is reported as such rather than
//! collapsed into a single success flag.

use petsync_types::{EntityId, EntityKind, RecordId};

/// A record the store refused inside an otherwise completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Entity whose record was refused.
    pub entity_id: EntityId,
    /// Store-reported cause.
    pub reason: String,
}

/// Result of pushing one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Kind pushed.
    pub kind: EntityKind,
    /// Entities now synced, with the id the store assigned.
    pub saved: Vec<(EntityId, RecordId)>,
    /// Entities the store refused; they stay unsynced.
    pub failed: Vec<RecordFailure>,
    /// Entities left out of the batch as duplicates; they stay unsynced.
    pub duplicates: Vec<EntityId>,
}

impl PushReport {
    /// An empty report for a kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            saved: Vec::new(),
            failed: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    /// True when every submitted record was saved.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of records submitted to the store.
    pub fn submitted(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

/// Result of pulling one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    /// Kind pulled.
    pub kind: EntityKind,
    /// Entities created locally from remote records.
    pub materialized: Vec<EntityId>,
    /// Remote records that could not be turned into entities.
    pub skipped: usize,
}

impl PullReport {
    /// An empty report for a kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            materialized: Vec::new(),
            skipped: 0,
        }
    }
}
