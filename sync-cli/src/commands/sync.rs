//! Run a full sync pass.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use petsync_client::{SyncOutcome, SyncReport, UserContext};

/// Run the sync command.
pub async fn run(data_dir: &Path, config: &Config) -> Result<()> {
    let reconciler = super::open(data_dir, config).await?;

    let report = match reconciler.perform_full_sync().await {
        SyncOutcome::Completed(report) => report,
        SyncOutcome::AlreadySyncing => {
            println!("A sync is already running.");
            return Ok(());
        }
    };
    print_report(&report);

    // Favorites can change on another device; refresh them if we can.
    let registered = reconciler
        .local()
        .current_user()
        .await?
        .map(|u| u.remote_id.is_some())
        .unwrap_or(false);
    if registered {
        match reconciler.refresh_user().await {
            Ok(user) => println!("Favorites: {}", user.favorites.len()),
            Err(e) => tracing::warn!("Could not refresh favorites: {}", e),
        }
    }

    if !report.is_clean() {
        anyhow::bail!("Sync finished with errors");
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("Push:");
    for (kind, result) in &report.push {
        match result {
            Ok(push) => {
                println!(
                    "  {:<8} {} saved, {} failed, {} duplicates",
                    kind.to_string(),
                    push.saved.len(),
                    push.failed.len(),
                    push.duplicates.len()
                );
                for failure in &push.failed {
                    println!("    {}: {}", failure.entity_id, failure.reason);
                }
            }
            Err(e) => println!("  {:<8} error: {}", kind.to_string(), e),
        }
    }

    println!("Pull:");
    for (kind, result) in &report.pull {
        match result {
            Ok(pull) => println!(
                "  {:<8} {} new, {} skipped",
                kind.to_string(),
                pull.materialized.len(),
                pull.skipped
            ),
            Err(e) => println!("  {:<8} error: {}", kind.to_string(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::add::{self, PetArgs, ShelterArgs};
    use crate::commands::testing::Device;
    use crate::commands::{favorite, init};
    use petsync_client::LocalStore;
    use petsync_types::{EntityId, EntityKind, Syncable};
    use tempfile::tempdir;

    #[tokio::test]
    async fn sync_pushes_local_pets() {
        let remote = tempdir().unwrap();
        let device = Device::new(remote.path());
        add::pet(
            device.path(),
            &device.config,
            PetArgs {
                id: "p1".into(),
                name: "Rex".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        run(device.path(), &device.config).await.unwrap();

        let reconciler = device.open().await;
        assert!(reconciler
            .local()
            .unsynced(EntityKind::Pet)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn two_devices_share_pets_through_remote() {
        let remote = tempdir().unwrap();
        let mut device_a = Device::new(remote.path());
        device_a.config.sync.kinds = EntityKind::ALL.to_vec();
        let mut device_b = Device::new(remote.path());
        device_b.config.sync.kinds = EntityKind::ALL.to_vec();

        add::pet(
            device_a.path(),
            &device_a.config,
            PetArgs {
                id: "p1".into(),
                name: "Rex".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        add::shelter(
            device_a.path(),
            &device_a.config,
            ShelterArgs {
                id: "s1".into(),
                name: "Happy Tails".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        run(device_a.path(), &device_a.config).await.unwrap();
        run(device_b.path(), &device_b.config).await.unwrap();

        let reconciler = device_b.open().await;
        let pet = reconciler
            .local()
            .get(EntityKind::Pet, &EntityId::new("p1"))
            .await
            .unwrap()
            .unwrap();
        assert!(pet.is_synced());
        assert_eq!(pet.name(), "Rex");
        assert_eq!(reconciler.local().all(EntityKind::Shelter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sync_refreshes_favorites() {
        let remote = tempdir().unwrap();
        let device = Device::new(remote.path());
        init::run(device.path(), &device.config, "Sam").await.unwrap();
        add::pet(
            device.path(),
            &device.config,
            PetArgs {
                id: "p1".into(),
                name: "Rex".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        favorite::run(device.path(), &device.config, "p1").await.unwrap();

        run(device.path(), &device.config).await.unwrap();

        let reconciler = device.open().await;
        let user = reconciler.local().current_user().await.unwrap().unwrap();
        assert_eq!(user.favorites.len(), 1);
    }
}
