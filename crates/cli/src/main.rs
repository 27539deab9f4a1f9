//! Cultural Club CLI - content seeding and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Load content from a YAML file
//! club-cli seed --file content.yaml
//!
//! # Check a seed file without writing anything
//! club-cli seed --file content.yaml --dry-run
//!
//! # Print the documents of a collection as JSON lines
//! club-cli list events
//!
//! # Grant or revoke admin privilege
//! club-cli admin grant <uid>
//! club-cli admin revoke <uid>
//! ```
//!
//! Commands talk to the Firebase project configured by `FIREBASE_API_KEY` and
//! `FIREBASE_PROJECT_ID`. When `CLUB_CLI_EMAIL` and `CLUB_CLI_PASSWORD` are set
//! the CLI signs in first and its requests carry that account's ID token.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use club_core::Collection;

mod commands;

#[derive(Parser)]
#[command(name = "club-cli")]
#[command(author, version, about = "Cultural Club CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load content records from a YAML file
    Seed {
        /// YAML file mapping collection names to lists of records
        #[arg(short, long)]
        file: PathBuf,

        /// Validate the file without writing to the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Print every document of a collection
    List {
        /// Collection name (events, committees, advisors, ...)
        collection: Collection,
    },
    /// Manage admin privilege
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant admin privilege to a user id
    Grant { uid: String },
    /// Revoke admin privilege from a user id
    Revoke { uid: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Seed { file, dry_run } => commands::seed::from_file(&file, dry_run).await?,
        Commands::List { collection } => commands::list::documents(collection).await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { uid } => commands::admin::grant(&uid).await?,
            AdminAction::Revoke { uid } => commands::admin::revoke(&uid).await?,
        },
    }
    Ok(())
}
