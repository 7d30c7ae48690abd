//! Pixel Vault CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pv-cli migrate
//!
//! # Create an admin account (password read from PIXEL_VAULT_ADMIN_PASSWORD)
//! pv-cli admin create -u admin -e admin@example.com
//!
//! # Load games from a YAML file
//! pv-cli seed catalog --file seed/catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin accounts
//! - `seed catalog` - Add games, stock and covers from a YAML file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "pv-cli")]
#[command(author, version, about = "Pixel Vault CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data into the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Phone number
        #[arg(long, default_value = "")]
        phone: String,

        /// Postal address
        #[arg(long, default_value = "")]
        address: String,

        /// Password (taken from the environment so it stays out of shell history)
        #[arg(long, env = "PIXEL_VAULT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Add games from a YAML catalog file
    Catalog {
        /// Path to the YAML file
        #[arg(short, long)]
        file: PathBuf,

        /// Validate the file without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                phone,
                address,
                password,
            } => {
                let account = commands::admin::NewAdmin {
                    username: &username,
                    email: &email,
                    phone: &phone,
                    address: &address,
                    password: &SecretString::from(password),
                };
                commands::admin::create_user(account).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, dry_run } => {
                let covers = commands::seed::cover_store_from_env();
                commands::seed::catalog(&file, &covers, dry_run).await?;
            }
        },
    }
    Ok(())
}
