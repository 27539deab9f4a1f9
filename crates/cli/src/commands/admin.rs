//! Admin privilege management.
//!
//! Privilege is the existence of an `admins/{uid}` document; these commands
//! create and remove it.

use chrono::Utc;
use serde_json::{Map, Value};

use club_core::{Collection, DocumentId};
use club_site::store::ContentStore;

use super::CliError;

/// Grant admin privilege to `uid`.
///
/// # Errors
///
/// Returns an error if the store rejects the write.
pub async fn grant(uid: &str) -> Result<(), CliError> {
    let store = super::connect().await?;

    let mut fields = Map::new();
    fields.insert("grantedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    store
        .set(Collection::Admins, &DocumentId::new(uid), fields)
        .await?;

    tracing::info!(uid, "Granted admin privilege");
    Ok(())
}

/// Revoke admin privilege from `uid`.
///
/// # Errors
///
/// Returns an error if the store rejects the delete.
pub async fn revoke(uid: &str) -> Result<(), CliError> {
    let store = super::connect().await?;
    store.delete(Collection::Admins, &DocumentId::new(uid)).await?;

    tracing::info!(uid, "Revoked admin privilege");
    Ok(())
}
