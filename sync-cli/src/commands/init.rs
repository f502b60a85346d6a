//! Set up the local user and its remote record.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use petsync_client::UserContext;

/// Run the init command.
pub async fn run(data_dir: &Path, config: &Config, name: &str) -> Result<()> {
    let reconciler = super::open(data_dir, config).await?;

    // Check if already initialized
    if let Some(user) = reconciler.local().current_user().await? {
        if user.remote_id.is_some() {
            anyhow::bail!(
                "User {} already initialized in {}.",
                user.name,
                data_dir.display()
            );
        }
    }

    let user = reconciler
        .register_user(name)
        .await
        .context("Failed to create user record")?;

    println!("User initialized successfully!");
    println!();
    println!("  User ID:  {}", user.id);
    println!("  Name:     {}", user.name);
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Add a pet: petsync add-pet --id <id> --name <name>");
    println!("  2. Favorite it: petsync favorite <id>");

    Ok(())
}
