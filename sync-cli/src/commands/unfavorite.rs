//! Unfavorite a pet: delete its remote record, unlink it from the user
//! record, then drop it locally.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use petsync_client::{LocalStore, UserContext};
use petsync_types::{EntityId, EntityKind, Syncable};

/// Run the unfavorite command.
pub async fn run(data_dir: &Path, config: &Config, pet_id: &str) -> Result<()> {
    let reconciler = super::open(data_dir, config).await?;
    let local = reconciler.local();
    let id = EntityId::new(pet_id);
    let pet = local
        .get(EntityKind::Pet, &id)
        .await?
        .with_context(|| format!("Unknown pet {}", pet_id))?;

    reconciler
        .delete_favorite(&pet)
        .await
        .context("Failed to delete favorite")?;

    // The record is gone remotely; keep the user record from pointing at it.
    let unlinked = match (local.current_user().await?, pet.remote_id()) {
        (Some(_), Some(remote_id)) => reconciler.remove_favorite(remote_id).await.map(|_| ()),
        _ => Ok(()),
    };
    local.delete(EntityKind::Pet, &id).await?;
    unlinked.context("Deleted pet record but failed to update favorites")?;

    println!("Unfavorited {}", pet.name());
    Ok(())
}
