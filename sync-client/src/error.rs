//! Reconciler error type.

use thiserror::Error;

use crate::local::LocalStoreError;
use crate::store::RemoteError;
use petsync_core::PlanError;
use petsync_types::{ConversionError, EntityId, RecordType};

/// Errors returned by [`Reconciler`](crate::Reconciler) operations.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An entity or user could not be converted to a remote record.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The remote store failed the request.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Local persistence failed.
    #[error("local store error: {0}")]
    Local(#[from] LocalStoreError),

    /// The operation needs a remote id the entity does not have.
    #[error("{entity_id} has no remote identifier")]
    MissingRemoteIdentifier {
        /// Entity lacking the id.
        entity_id: EntityId,
    },

    /// No current user.
    #[error("no current user")]
    NotReady,

    /// Two local entities map to the same remote record.
    #[error("duplicate {record_type} record for {entity_id}")]
    DuplicateRecord {
        /// Record type of the collision.
        record_type: RecordType,
        /// Shared entity id.
        entity_id: EntityId,
    },
}

impl From<PlanError> for ReconcileError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Conversion { source, .. } => Self::Conversion(source),
            PlanError::Duplicate {
                record_type,
                entity_id,
            } => Self::DuplicateRecord {
                record_type,
                entity_id,
            },
        }
    }
}
