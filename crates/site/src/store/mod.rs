//! Content store collaborator.
//!
//! Collections hold schemaless JSON documents addressed by [`DocumentId`].
//! [`ContentStore`] is the object-safe interface each backend implements;
//! [`Records`] layers typed access over it for every [`Record`] type.

pub mod codec;
mod error;
mod firestore;
mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use club_core::{Collection, DocumentId, Record, Stored};

pub use error::StoreError;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Field map of a document.
pub type Fields = Map<String, Value>;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

/// Operations the site consumes from a document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every document of a collection.
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>>;

    /// A single document, `None` if it does not exist.
    async fn get(&self, collection: Collection, id: &DocumentId) -> Result<Option<Document>>;

    /// Add a document under a generated id.
    async fn create(&self, collection: Collection, fields: Fields) -> Result<DocumentId>;

    /// Create or replace a document under a known id.
    async fn set(&self, collection: Collection, id: &DocumentId, fields: Fields) -> Result<()>;

    /// Overwrite the given top-level fields of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(&self, collection: Collection, id: &DocumentId, partial: Fields) -> Result<()>;

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, collection: Collection, id: &DocumentId) -> Result<()>;

    /// Every document of a collection grouped by the value of `field`.
    ///
    /// Documents without the field are grouped under the empty key. String
    /// values are used as-is, other values by their JSON text.
    async fn list_grouped_by(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<BTreeMap<String, Vec<Document>>> {
        let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();
        for document in self.list_all(collection).await? {
            let key = match document.fields.get(field) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            groups.entry(key).or_default().push(document);
        }
        Ok(groups)
    }
}

/// Typed access to the collections of [`Record`] types.
#[async_trait]
pub trait Records: ContentStore {
    /// Every record of `T`'s collection.
    ///
    /// Documents that do not decode as `T` are skipped with a warning.
    async fn records<T: Record>(&self) -> Result<Vec<Stored<T>>> {
        let documents = self.list_all(T::COLLECTION).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match decode::<T>(document) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    tracing::warn!(collection = %T::COLLECTION, error = %err, "Skipping undecodable document");
                    None
                }
            })
            .collect())
    }

    /// A single record.
    async fn record<T: Record>(&self, id: &DocumentId) -> Result<Option<Stored<T>>> {
        self.get(T::COLLECTION, id)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    /// Store a new record.
    async fn insert<T: Record>(&self, record: &T) -> Result<DocumentId> {
        self.create(T::COLLECTION, encode(record)?).await
    }
}

impl<S: ContentStore + ?Sized> Records for S {}

/// Serialize a record to its field map.
///
/// # Errors
///
/// Returns `StoreError::Codec` if `T` does not serialize to a JSON object.
pub fn encode<T: Record>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Codec(format!(
            "{} record serialized to a non-object: {other}",
            T::COLLECTION
        ))),
    }
}

/// Deserialize a document into a stored record.
///
/// # Errors
///
/// Returns `StoreError::Codec` if the fields do not match `T`.
pub fn decode<T: Record>(document: Document) -> Result<Stored<T>> {
    let record = serde_json::from_value(Value::Object(document.fields))?;
    Ok(Stored::new(document.id, record))
}
