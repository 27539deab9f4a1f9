//! Print the documents of a collection.

use serde_json::{Value, json};

use club_core::Collection;
use club_site::store::ContentStore;

use super::CliError;

/// Print every document of `collection` as one JSON object per line.
///
/// # Errors
///
/// Returns an error if the store cannot be reached or listed.
#[allow(clippy::print_stdout)]
pub async fn documents(collection: Collection) -> Result<(), CliError> {
    let store = super::connect().await?;
    let documents = store.list_all(collection).await?;

    for document in &documents {
        let line = json!({
            "id": document.id.as_str(),
            "fields": Value::Object(document.fields.clone()),
        });
        println!("{}", serde_json::to_string(&line)?);
    }

    tracing::info!(%collection, count = documents.len(), "Listed documents");
    Ok(())
}
