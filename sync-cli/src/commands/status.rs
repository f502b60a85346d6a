//! Show sync status.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use petsync_client::{LocalStore, UserContext};
use petsync_types::{Entity, EntityKind, Syncable};

/// Synced and unsynced entity counts for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindCounts {
    pub synced: usize,
    pub unsynced: usize,
}

impl KindCounts {
    fn of(entities: &[Entity]) -> Self {
        let synced = entities.iter().filter(|e| e.is_synced()).count();
        Self {
            synced,
            unsynced: entities.len() - synced,
        }
    }
}

/// Run the status command.
pub async fn run(data_dir: &Path, config: &Config) -> Result<()> {
    let reconciler = super::open(data_dir, config).await?;
    let local = reconciler.local();

    println!("=== petsync status ===");
    println!();

    let pets = local.all(EntityKind::Pet).await?;
    match local.current_user().await? {
        Some(user) => {
            println!("User:");
            println!("  ID:        {}", user.id);
            println!("  Name:      {}", user.name);
            match &user.remote_id {
                Some(id) => println!("  Record:    {}", id),
                None => println!("  Record:    NOT REGISTERED"),
            }
            println!("  Favorites: {}", user.favorites.len());
            for reference in user.favorites.iter() {
                let name = pets
                    .iter()
                    .find(|p| p.remote_id() == Some(&reference.record_id))
                    .map(|p| p.name())
                    .unwrap_or("(not held locally)");
                println!("    {} {}", reference.record_id, name);
            }
        }
        None => {
            println!("User: NOT INITIALIZED");
            println!();
            println!("Run 'petsync init --name <name>' to initialize.");
        }
    }

    println!();
    println!("Entities:");
    for kind in EntityKind::ALL {
        let counts = if kind == EntityKind::Pet {
            KindCounts::of(&pets)
        } else {
            KindCounts::of(&local.all(kind).await?)
        };
        println!(
            "  {:<8} {} synced, {} unsynced",
            kind.to_string(),
            counts.synced,
            counts.unsynced
        );
    }

    println!();
    println!("Remote: {}", config.remote_dir(data_dir).display());

    Ok(())
}
