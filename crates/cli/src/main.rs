//! GameStore CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gamestore-cli migrate
//!
//! # Create an admin account (or promote an existing one and reset its password)
//! gamestore-cli admin create -e admin@example.com -p 'a long password'
//!
//! # Grant or revoke admin on an existing account
//! gamestore-cli admin promote -e someone@example.com
//! gamestore-cli admin demote -e someone@example.com
//!
//! # Load categories, subcategories and products from YAML
//! gamestore-cli seed catalog crates/cli/seed/catalog.yaml
//!
//! # Create the quick-login demo accounts used in testing mode
//! gamestore-cli seed demo
//! ```
//!
//! Every command reads `DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gamestore-cli")]
#[command(author, version, about = "GameStore CLI tools")]
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
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin account, or promote an existing one and reset its password
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "GAMESTORE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Grant admin to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke admin from an account
    Demote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load a catalog from a YAML file
    Catalog {
        /// Path to the YAML file
        file: String,
    },
    /// Create the demo accounts offered on the sign-in page in testing mode
    Demo,
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
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, password } => {
                commands::admin::create(&email, &password).await?;
            }
            AdminAction::Promote { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Demote { email } => commands::admin::set_admin(&email, false).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
            SeedTarget::Demo => commands::seed::demo().await?,
        },
    }
    Ok(())
}
