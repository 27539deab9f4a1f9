//! Content store error types.

use club_core::{Collection, DocumentId};
use thiserror::Error;

/// Errors that can occur when reading or writing content.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend refused the operation for the current credentials.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Document does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound {
        collection: Collection,
        id: DocumentId,
    },

    /// Backend returned an unexpected error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Document could not be converted to or from its stored form.
    #[error("codec error: {0}")]
    Codec(String),

    /// Store is unavailable (used by the in-memory store to simulate outages).
    #[error("store unavailable")]
    Unavailable,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}
