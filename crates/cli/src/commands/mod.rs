//! Command implementations and the store connection they share.

pub mod admin;
pub mod list;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use club_site::config::{ConfigError, FirebaseConfig};
use club_site::identity::{AuthError, FirebaseIdentity, IdentityProvider, TokenSource};
use club_site::store::{FirestoreStore, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sign-in failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid records found")]
    InvalidRecords(usize),

    #[error("Cannot encode document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the configured Firestore project.
///
/// Signs in first when `CLUB_CLI_EMAIL` and `CLUB_CLI_PASSWORD` are set.
///
/// # Errors
///
/// Returns an error if configuration is missing, the HTTP client cannot be
/// built, or the sign-in is rejected.
pub async fn connect() -> Result<FirestoreStore, CliError> {
    dotenvy::dotenv().ok();

    let config = FirebaseConfig::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("club-cli/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let tokens = match (
        std::env::var("CLUB_CLI_EMAIL").ok(),
        std::env::var("CLUB_CLI_PASSWORD").ok(),
    ) {
        (Some(email), Some(password)) => {
            let identity = Arc::new(FirebaseIdentity::new(http.clone(), config.clone()));
            let session = identity.sign_in(&email, &password).await?;
            tracing::info!(email = %session.email, "Signed in");
            let tokens: Arc<dyn TokenSource> = identity;
            Some(tokens)
        }
        _ => {
            tracing::info!("No CLI credentials set, sending unauthenticated requests");
            None
        }
    };

    Ok(FirestoreStore::new(http, &config, tokens))
}
