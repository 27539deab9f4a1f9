//! Firestore REST client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use club_core::{Collection, DocumentId};

use super::codec::{decode_fields, document_id, encode_fields};
use super::{ContentStore, Document, Fields, Result, StoreError};
use crate::config::FirebaseConfig;
use crate::identity::TokenSource;

/// Page size requested when listing a collection.
const PAGE_SIZE: u32 = 300;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl TryFrom<RawDocument> for Document {
    type Error = StoreError;

    fn try_from(raw: RawDocument) -> Result<Self> {
        Ok(Self {
            id: DocumentId::new(document_id(&raw.name)),
            fields: decode_fields(&raw.fields)?,
        })
    }
}

/// Document store backed by Cloud Firestore.
///
/// Requests carry the signed-in user's ID token when a token source is
/// attached, so the project's security rules apply to each browser tab.
#[derive(Clone)]
pub struct FirestoreStore {
    http: reqwest::Client,
    documents_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl FirestoreStore {
    /// Create a store for the project in `config`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        config: &FirebaseConfig,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        Self {
            http,
            documents_url: config.documents_url(),
            tokens,
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.documents_url, collection.path())
    }

    fn document_url(&self, collection: Collection, id: &DocumentId) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id.as_str())
        )
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = match &self.tokens {
            Some(tokens) => tokens.bearer_token().await,
            None => None,
        };
        match token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        Ok(self.authorized(request).await.send().await?)
    }
}

/// Map a non-success response to a store error.
async fn failure(
    response: Response,
    collection: Collection,
    id: Option<&DocumentId>,
) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);

    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound {
            collection,
            id: id.clone(),
        },
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            StoreError::PermissionDenied(message)
        }
        _ => StoreError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl ContentStore for FirestoreStore {
    #[tracing::instrument(skip(self))]
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}?pageSize={PAGE_SIZE}", self.collection_url(collection));
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(token));
            }

            let response = self.send(self.http.get(&url)).await?;
            if !response.status().is_success() {
                return Err(failure(response, collection, None).await);
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StoreError::Codec(e.to_string()))?;
            for raw in page.documents {
                documents.push(Document::try_from(raw)?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = documents.len(), "Listed collection");
        Ok(documents)
    }

    async fn get(&self, collection: Collection, id: &DocumentId) -> Result<Option<Document>> {
        let response = self
            .send(self.http.get(self.document_url(collection, id)))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure(response, collection, Some(id)).await);
        }

        let raw: RawDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        Document::try_from(raw).map(Some)
    }

    #[tracing::instrument(skip(self, fields))]
    async fn create(&self, collection: Collection, fields: Fields) -> Result<DocumentId> {
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .send(self.http.post(self.collection_url(collection)).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, None).await);
        }

        let raw: RawDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(DocumentId::new(document_id(&raw.name)))
    }

    #[tracing::instrument(skip(self, fields))]
    async fn set(&self, collection: Collection, id: &DocumentId, fields: Fields) -> Result<()> {
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .send(
                self.http
                    .patch(self.document_url(collection, id))
                    .json(&body),
            )
            .await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, Some(id)).await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, partial))]
    async fn update(&self, collection: Collection, id: &DocumentId, partial: Fields) -> Result<()> {
        let mut url = format!(
            "{}?currentDocument.exists=true",
            self.document_url(collection, id)
        );
        for field in partial.keys() {
            url.push_str("&updateMask.fieldPaths=");
            url.push_str(&urlencoding::encode(&field_path(field)));
        }

        let body = json!({ "fields": encode_fields(&partial) });
        let response = self.send(self.http.patch(&url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, Some(id)).await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, collection: Collection, id: &DocumentId) -> Result<()> {
        let response = self
            .send(self.http.delete(self.document_url(collection, id)))
            .await?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(failure(response, collection, Some(id)).await);
        }
        Ok(())
    }
}

/// Quote a field name for use in a field path when it is not a simple
/// identifier.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn store() -> FirestoreStore {
        let config = FirebaseConfig {
            api_key: SecretString::from("AIzaSyDpLk3uxRRXfNM-hYaX9ERedUNQSBRa0"),
            project_id: "club-main".to_string(),
            identity_url: "https://identitytoolkit.googleapis.com".parse().unwrap(),
            token_url: "https://securetoken.googleapis.com".parse().unwrap(),
            firestore_url: "http://localhost:8080".parse().unwrap(),
        };
        FirestoreStore::new(reqwest::Client::new(), &config, None)
    }

    #[test]
    fn test_document_urls() {
        let store = store();
        assert_eq!(
            store.collection_url(Collection::GalleryItems),
            "http://localhost:8080/v1/projects/club-main/databases/(default)/documents/galleryItems"
        );
        assert!(
            store
                .document_url(Collection::Events, &DocumentId::new("a b"))
                .ends_with("/events/a%20b")
        );
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("imageUrl"), "imageUrl");
        assert_eq!(field_path("type"), "type");
        assert_eq!(field_path("2nd"), "`2nd`");
        assert_eq!(field_path("with-dash"), "`with-dash`");
    }

    #[test]
    fn test_raw_document_conversion() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/club-main/databases/(default)/documents/events/e1",
            "fields": {
                "title": { "stringValue": "Spring Fest" },
                "year": { "integerValue": "2024" }
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let document = Document::try_from(raw).unwrap();
        assert_eq!(document.id.as_str(), "e1");
        assert_eq!(document.fields["year"], 2024);
    }

    #[test]
    fn test_empty_list_page() {
        let page: ListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
