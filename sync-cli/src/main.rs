//! # petsync
//!
//! CLI for favoriting pets and syncing them with a shared record store.
//!
//! ## Commands
//!
//! - `init`: Create the local user and its remote record
//! - `add-pet` / `add-shelter`: Store an unsynced entity locally
//! - `favorite` / `unfavorite`: Favorite or unfavorite a pet
//! - `sync`: Push unsynced entities, then pull new ones
//! - `status`: Show user, favorites, and sync counts
//!
//! ## Example
//!
//! ```bash
//! # Set up the user
//! petsync init --name "Sam"
//!
//! # Add and favorite a pet
//! petsync add-pet --id p1 --name Rex --animal Dog
//! petsync favorite p1
//!
//! # On another data dir pointed at the same remote, pull it
//! petsync --data-dir /tmp/other sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::add::{PetArgs, ShelterArgs};
use commands::{add, favorite, init, status, sync, unfavorite};
use config::Config;

/// CLI for favoriting pets and syncing them with a shared record store.
#[derive(Parser, Debug)]
#[command(name = "petsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the local store and config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: petsync.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the local user and its remote record
    Init {
        /// User name
        #[arg(long, short)]
        name: String,
    },

    /// Add a pet to the local store
    AddPet {
        /// Listing id
        #[arg(long)]
        id: String,

        /// Pet name
        #[arg(long, short)]
        name: String,

        /// Species, e.g. Dog
        #[arg(long)]
        animal: Option<String>,

        /// Listing id of the pet's shelter
        #[arg(long)]
        shelter_id: Option<String>,
    },

    /// Add a shelter to the local store
    AddShelter {
        /// Listing id
        #[arg(long)]
        id: String,

        /// Shelter name
        #[arg(long, short)]
        name: String,

        /// City
        #[arg(long)]
        city: Option<String>,

        /// State or region
        #[arg(long)]
        state: Option<String>,
    },

    /// Favorite a local pet
    Favorite {
        /// Listing id of the pet
        pet_id: String,
    },

    /// Unfavorite a pet and remove it locally
    Unfavorite {
        /// Listing id of the pet
        pet_id: String,
    },

    /// Push unsynced entities, then pull new ones
    Sync,

    /// Show sync status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let config = Config::load(&data_dir, cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { name } => {
            init::run(&data_dir, &config, &name).await?;
        }
        Commands::AddPet {
            id,
            name,
            animal,
            shelter_id,
        } => {
            let args = PetArgs {
                id,
                name,
                animal,
                shelter_id,
            };
            add::pet(&data_dir, &config, args).await?;
        }
        Commands::AddShelter {
            id,
            name,
            city,
            state,
        } => {
            let args = ShelterArgs {
                id,
                name,
                city,
                state,
            };
            add::shelter(&data_dir, &config, args).await?;
        }
        Commands::Favorite { pet_id } => {
            favorite::run(&data_dir, &config, &pet_id).await?;
        }
        Commands::Unfavorite { pet_id } => {
            unfavorite::run(&data_dir, &config, &pet_id).await?;
        }
        Commands::Sync => {
            sync::run(&data_dir, &config).await?;
        }
        Commands::Status => {
            status::run(&data_dir, &config).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for petsync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "petrescue", "petsync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
