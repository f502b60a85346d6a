//! CLI command implementations.

pub mod add;
pub mod favorite;
pub mod init;
pub mod status;
pub mod sync;
pub mod unfavorite;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{Config, LOCAL_FILE};
use petsync_client::{FileLocalStore, FileRecordStore, Reconciler};

/// Reconciler over the on-disk stores used by every command.
pub type CliReconciler = Reconciler<FileRecordStore, FileLocalStore>;

/// Open the local and remote stores for a data directory.
pub async fn open(data_dir: &Path, config: &Config) -> Result<CliReconciler> {
    let remote = FileRecordStore::open(config.remote_dir(data_dir))
        .await
        .context("Failed to open remote store")?;
    let local = FileLocalStore::open(data_dir.join(LOCAL_FILE))
        .await
        .context("Failed to open local store")?;
    Ok(Reconciler::new(config.sync.clone(), remote, local))
}
