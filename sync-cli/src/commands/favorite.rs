//! Favorite a local pet.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use petsync_client::LocalStore;
use petsync_types::{EntityId, EntityKind, Syncable};

/// Run the favorite command.
pub async fn run(data_dir: &Path, config: &Config, pet_id: &str) -> Result<()> {
    let reconciler = super::open(data_dir, config).await?;
    let pet = reconciler
        .local()
        .get(EntityKind::Pet, &EntityId::new(pet_id))
        .await?
        .with_context(|| format!("Unknown pet {}. Add it with 'petsync add-pet'.", pet_id))?;

    let pet = reconciler
        .save_favorite(pet)
        .await
        .context("Failed to favorite pet")?;

    println!(
        "Favorited {} ({})",
        pet.name(),
        pet.remote_id().map(|id| id.as_str()).unwrap_or("-")
    );
    Ok(())
}
