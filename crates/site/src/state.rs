//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendConfig, FirebaseConfig, SiteConfig};
use crate::identity::{
    FirebaseIdentity, IdentityProvider, MemoryDirectory, MemoryIdentity, TokenSource,
};
use crate::store::{ContentStore, FirestoreStore, MemoryStore};

/// Timeout applied to every backend request.
const BACKEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Each live session asks it for
/// a fresh identity handle and a store bound to that handle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    backend: Backend,
}

enum Backend {
    Firebase {
        http: reqwest::Client,
        config: FirebaseConfig,
    },
    Memory {
        directory: MemoryDirectory,
        store: MemoryStore,
    },
}

impl AppState {
    /// Create the application state for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SiteConfig) -> Result<Self, reqwest::Error> {
        let backend = match &config.backend {
            BackendConfig::Firebase(firebase) => Backend::Firebase {
                http: reqwest::Client::builder()
                    .timeout(BACKEND_TIMEOUT)
                    .user_agent(concat!("club-site/", env!("CARGO_PKG_VERSION")))
                    .build()?,
                config: firebase.clone(),
            },
            BackendConfig::Memory => Backend::Memory {
                directory: MemoryDirectory::new(),
                store: MemoryStore::new(),
            },
        };

        Ok(Self {
            inner: Arc::new(AppStateInner { config, backend }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Collaborators for one live session.
    ///
    /// With Firebase the store authenticates with the session's own ID
    /// token, so security rules see the signed-in user of that tab.
    #[must_use]
    pub fn open_session(&self) -> (Arc<dyn IdentityProvider>, Arc<dyn ContentStore>) {
        match &self.inner.backend {
            Backend::Firebase { http, config } => {
                let identity = Arc::new(FirebaseIdentity::new(http.clone(), config.clone()));
                let tokens: Arc<dyn TokenSource> = identity.clone();
                let store: Arc<dyn ContentStore> =
                    Arc::new(FirestoreStore::new(http.clone(), config, Some(tokens)));
                let identity: Arc<dyn IdentityProvider> = identity;
                (identity, store)
            }
            Backend::Memory { directory, store } => {
                let identity: Arc<dyn IdentityProvider> =
                    Arc::new(MemoryIdentity::new(directory.clone()));
                let store: Arc<dyn ContentStore> = Arc::new(store.clone());
                (identity, store)
            }
        }
    }

    /// Whether the backend can be reached. Used by the readiness probe.
    pub async fn backend_ready(&self) -> bool {
        match &self.inner.backend {
            Backend::Firebase { http, config } => http
                .get(format!("{}/admins?pageSize=1", config.documents_url()))
                .send()
                .await
                .is_ok_and(|response| !response.status().is_server_error()),
            Backend::Memory { .. } => true,
        }
    }
}
