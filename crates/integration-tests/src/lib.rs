//! Integration tests for the Cultural Club site.
//!
//! Tests drive real [`LiveSession`]s over their message channels, with a
//! [`FakeBrowser`] standing in for the page script: it keeps an address bar,
//! applies renders and caches the credential the way `live.js` does.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p club-integration-tests
//! ```
//!
//! Everything runs against [`MemoryDirectory`] and [`MemoryStore`]; no
//! network access is needed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use club_core::{FragmentResolution, IdentityRef, Route};
use club_site::admin::AdminAction;
use club_site::identity::{IdentityProvider, MemoryDirectory, MemoryIdentity};
use club_site::live::{ClientMessage, LiveSession, ServerMessage};
use club_site::store::{ContentStore, MemoryStore};

/// How long a test waits for the site before giving up.
const WAIT: Duration = Duration::from_secs(5);

/// An in-memory site: one account directory and one document store shared
/// by every browser opened on it.
#[derive(Clone, Default)]
pub struct TestSite {
    pub directory: MemoryDirectory,
    pub store: MemoryStore,
}

impl TestSite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member account.
    ///
    /// # Panics
    ///
    /// Panics if the account cannot be created.
    pub async fn member(&self, email: &str, password: &str) -> IdentityRef {
        match self.directory.register(email, password).await {
            Ok(identity) => identity,
            Err(err) => panic!("register {email}: {err}"),
        }
    }

    /// Register an account and grant it admin privilege.
    pub async fn admin(&self, email: &str, password: &str) -> IdentityRef {
        let identity = self.member(email, password).await;
        self.directory.grant_admin(&identity).await;
        identity
    }

    /// Open a tab at `fragment` with nothing cached.
    pub async fn open(&self, fragment: &str) -> FakeBrowser {
        self.open_with_credential(fragment, None).await
    }

    /// Open a tab at `fragment` with a cached credential.
    pub async fn open_with_credential(
        &self,
        fragment: &str,
        credential: Option<String>,
    ) -> FakeBrowser {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(MemoryIdentity::new(self.directory.clone()));
        let store: Arc<dyn ContentStore> = Arc::new(self.store.clone());
        FakeBrowser::connect(identity, store, fragment, credential).await
    }
}

/// A simulated browser tab.
pub struct FakeBrowser {
    to_site: mpsc::Sender<ClientMessage>,
    from_site: mpsc::Receiver<ServerMessage>,
    hash: String,
    credential: Option<String>,
    header: String,
    main: String,
    headers_seen: Vec<String>,
    pages_seen: Vec<(String, String)>,
    fragment_writes: Vec<String>,
    renders: usize,
    scrolls: usize,
    session: JoinHandle<()>,
}

impl FakeBrowser {
    /// Start a live session and send `hello`.
    pub async fn connect(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn ContentStore>,
        fragment: &str,
        credential: Option<String>,
    ) -> Self {
        let (to_site, inbound) = mpsc::channel(64);
        let (outbound, from_site) = mpsc::channel(64);
        let session = tokio::spawn(LiveSession::run(identity, store, inbound, outbound));

        let mut browser = Self {
            to_site,
            from_site,
            hash: fragment.to_string(),
            credential: credential.clone(),
            header: String::new(),
            main: String::new(),
            headers_seen: Vec::new(),
            pages_seen: Vec::new(),
            fragment_writes: Vec::new(),
            renders: 0,
            scrolls: 0,
            session,
        };
        browser
            .send(ClientMessage::Hello {
                fragment: fragment.to_string(),
                credential,
            })
            .await;
        browser
    }

    /// Send a raw client message.
    ///
    /// # Panics
    ///
    /// Panics if the session has ended.
    pub async fn send(&mut self, message: ClientMessage) {
        if self.to_site.send(message).await.is_err() {
            panic!("live session ended");
        }
    }

    /// Type a fragment into the address bar.
    pub async fn visit(&mut self, fragment: &str) {
        if self.hash != fragment {
            self.hash = fragment.to_string();
            self.send(ClientMessage::FragmentChanged {
                fragment: fragment.to_string(),
            })
            .await;
        }
    }

    /// Press a navigation button.
    pub async fn navigate(&mut self, route: Route) {
        self.send(ClientMessage::Navigate { route }).await;
    }

    /// Click the in-app link for `token`, as `live.js` does for
    /// `data-navigate` elements.
    ///
    /// # Panics
    ///
    /// Panics if the rendered page has no such link.
    pub async fn click_link(&mut self, token: &str) {
        let attribute = format!("data-navigate=\"{token}\"");
        assert!(
            self.header.contains(&attribute) || self.main.contains(&attribute),
            "no link to {token} on the page"
        );
        let FragmentResolution::Recognized(route) = Route::resolve(token) else {
            panic!("{token} is not a route token");
        };
        self.navigate(route).await;
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) {
        self.send(ClientMessage::SignIn {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await;
    }

    pub async fn sign_up(&mut self, email: &str, password: &str, confirm_password: &str) {
        self.send(ClientMessage::SignUp {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        })
        .await;
    }

    pub async fn sign_out(&mut self) {
        self.send(ClientMessage::SignOut).await;
    }

    pub async fn submit_contact(&mut self, name: &str, email: &str, message: &str) {
        self.send(ClientMessage::SubmitContact {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
        .await;
    }

    pub async fn admin(&mut self, action: AdminAction) {
        self.send(ClientMessage::Admin { action }).await;
    }

    /// Apply server messages until `condition` holds.
    ///
    /// # Panics
    ///
    /// Panics with the current page if the condition does not hold in time.
    pub async fn wait_until(&mut self, what: &str, condition: impl Fn(&Self) -> bool) {
        let deadline = Instant::now() + WAIT;
        while !condition(self) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.from_site.recv()).await {
                Ok(Some(message)) => self.apply(message).await,
                Ok(None) => panic!("live session ended while waiting for {what}"),
                Err(_) => panic!(
                    "timed out waiting for {what}\nhash: {}\nheader: {}\nmain: {}",
                    self.hash, self.header, self.main
                ),
            }
        }
    }

    /// Wait until the main area contains `text`.
    pub async fn wait_for_text(&mut self, text: &str) {
        self.wait_until(text, |b| b.main.contains(text)).await;
    }

    /// Apply server messages until the site has been quiet for a moment.
    pub async fn settle(&mut self) {
        while let Ok(Some(message)) =
            tokio::time::timeout(Duration::from_millis(150), self.from_site.recv()).await
        {
            self.apply(message).await;
        }
    }

    async fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::SetFragment { fragment } => {
                self.fragment_writes.push(fragment.clone());
                // Assigning the same hash fires no hashchange.
                if self.hash != fragment {
                    self.hash.clone_from(&fragment);
                    self.send(ClientMessage::FragmentChanged { fragment }).await;
                }
            }
            ServerMessage::ScrollTop => self.scrolls += 1,
            ServerMessage::Render { header, main } => {
                self.renders += 1;
                self.headers_seen.push(header.clone());
                self.pages_seen.push((self.hash.clone(), main.clone()));
                self.header = header;
                self.main = main;
            }
            ServerMessage::Credential { token } => self.credential = token,
        }
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn main(&self) -> &str {
        &self.main
    }

    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Every (hash, main) pair rendered so far, oldest first.
    #[must_use]
    pub fn pages_seen(&self) -> &[(String, String)] {
        &self.pages_seen
    }

    /// Every header rendered so far, oldest first.
    #[must_use]
    pub fn headers_seen(&self) -> &[String] {
        &self.headers_seen
    }

    /// Fragments the site asked the browser to write, oldest first.
    #[must_use]
    pub fn fragment_writes(&self) -> &[String] {
        &self.fragment_writes
    }

    #[must_use]
    pub const fn renders(&self) -> usize {
        self.renders
    }

    #[must_use]
    pub const fn scrolls(&self) -> usize {
        self.scrolls
    }

    /// Close the tab and wait for the session to end.
    pub async fn close(self) {
        let Self {
            to_site, session, ..
        } = self;
        drop(to_site);
        let _ = tokio::time::timeout(WAIT, session).await;
    }
}

/// Markers the pages render, so tests do not depend on copy.
pub mod marker {
    pub const LOADING: &str = "Loading&hellip;";
    pub const LOGIN_FORM: &str = "data-live=\"sign_in\"";
    pub const REGISTER_FORM: &str = "data-live=\"sign_up\"";
    pub const HOME_HERO: &str = "class=\"hero\"";
    pub const PORTAL: &str = "<h1>Member Portal</h1>";
    pub const ADMIN: &str = "<h1>Admin Panel</h1>";
    pub const SIGN_OUT: &str = "data-live=\"sign_out\"";
}
