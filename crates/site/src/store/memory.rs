//! In-memory document store for local development and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use club_core::{Collection, DocumentId};

use super::{ContentStore, Document, Fields, Result, StoreError};

type Collections = HashMap<Collection, BTreeMap<DocumentId, Fields>>;

/// Document store held in process memory.
///
/// Clones share the same documents. Documents are listed in id order, as
/// the hosted store does.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>> {
        self.check_available()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &DocumentId) -> Result<Option<Document>> {
        self.check_available()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document {
                id: id.clone(),
                fields: fields.clone(),
            }))
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<DocumentId> {
        self.check_available()?;
        let id = DocumentId::new(uuid::Uuid::new_v4().simple().to_string());
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &DocumentId, fields: Fields) -> Result<()> {
        self.check_available()?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        Ok(())
    }

    async fn update(&self, collection: Collection, id: &DocumentId, partial: Fields) -> Result<()> {
        self.check_available()?;
        let mut collections = self.collections.write().await;
        let fields = collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.clone(),
            })?;
        fields.extend(partial);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &DocumentId) -> Result<()> {
        self.check_available()?;
        if let Some(documents) = self.collections.write().await.get_mut(&collection) {
            documents.remove(id);
        }
        Ok(())
    }
}
