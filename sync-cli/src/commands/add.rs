//! Add unsynced pets and shelters to the local store.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use petsync_client::LocalStore;
use petsync_types::{Entity, Pet, Shelter, Syncable};

/// Fields accepted by `add-pet`.
#[derive(Debug, Clone, Default)]
pub struct PetArgs {
    pub id: String,
    pub name: String,
    pub animal: Option<String>,
    pub shelter_id: Option<String>,
}

/// Fields accepted by `add-shelter`.
#[derive(Debug, Clone, Default)]
pub struct ShelterArgs {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Run the add-pet command.
pub async fn pet(data_dir: &Path, config: &Config, args: PetArgs) -> Result<()> {
    let mut pet = Pet::new(args.id, args.name);
    pet.animal = args.animal;
    pet.shelter_id = args.shelter_id;
    insert(data_dir, config, pet.into()).await
}

/// Run the add-shelter command.
pub async fn shelter(data_dir: &Path, config: &Config, args: ShelterArgs) -> Result<()> {
    let mut shelter = Shelter::new(args.id, args.name);
    shelter.city = args.city;
    shelter.state = args.state;
    insert(data_dir, config, shelter.into()).await
}

async fn insert(data_dir: &Path, config: &Config, entity: Entity) -> Result<()> {
    let id = entity.entity_id().clone();
    if id.is_empty() {
        anyhow::bail!("An id is required");
    }

    let reconciler = super::open(data_dir, config).await?;
    let local = reconciler.local();
    if local.get(entity.kind(), &id).await?.is_some() {
        anyhow::bail!("{} {} already exists", entity.kind(), id);
    }

    let (kind, name) = (entity.kind(), entity.name().to_string());
    local.put(entity).await?;
    println!("Added {} {} ({}), not yet synced", kind, id, name);
    Ok(())
}
