//! Identity collaborator.
//!
//! Each live session owns one [`IdentityProvider`] handle. The handle keeps the
//! signed-in state for that browser tab and announces every change through a
//! [`SessionStream`]. Two implementations exist:
//!
//! - [`FirebaseIdentity`] talks to the Identity Toolkit and Secure Token REST
//!   APIs and checks privilege against the `admins/{uid}` document.
//! - [`MemoryIdentity`] is backed by an in-process [`MemoryDirectory`] and is
//!   used for local development and tests.

mod error;
mod firebase;
mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::watch;

use club_core::{IdentityRef, Session};

pub use error::AuthError;
pub use firebase::FirebaseIdentity;
pub use memory::{MemoryDirectory, MemoryIdentity};

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Operations the site consumes from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Snapshot of the current session.
    fn current_session(&self) -> Option<Session>;

    /// Subscribe to session changes.
    ///
    /// The stream yields the current value first, then each change.
    fn subscribe(&self) -> SessionStream;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account and sign in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Whether the identity holds admin privilege.
    ///
    /// Fails closed: any lookup error yields `false`.
    async fn is_privileged(&self, identity: &IdentityRef) -> bool;

    /// Restore a session from a credential previously handed out by
    /// [`IdentityProvider::credential`].
    async fn restore(&self, credential: &SecretString) -> Result<Session>;

    /// A credential the browser can cache to restore this session later.
    async fn credential(&self) -> Option<SecretString>;
}

/// Source of bearer tokens for authenticated backend requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The current ID token, if signed in.
    async fn bearer_token(&self) -> Option<SecretString>;
}

/// Stream of session-change notifications.
///
/// Backed by a watch channel: the first call to [`SessionStream::next`]
/// returns the value current at subscription time, later calls wait for a
/// change. Rapid successive changes may coalesce to the latest value.
#[derive(Debug)]
pub struct SessionStream {
    rx: watch::Receiver<Option<Session>>,
    primed: bool,
}

impl SessionStream {
    /// Wrap a watch receiver.
    #[must_use]
    pub const fn new(rx: watch::Receiver<Option<Session>>) -> Self {
        Self { rx, primed: false }
    }

    /// Next notification, or `None` once the provider is gone.
    ///
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use club_core::Email;

    fn session(uid: &str) -> Session {
        Session::new(
            IdentityRef::new(uid),
            Email::parse(&format!("{uid}@club.org")).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_stream_yields_current_value_first() {
        let (tx, rx) = watch::channel(Some(session("u1")));
        let mut stream = SessionStream::new(rx);

        assert_eq!(stream.next().await, Some(Some(session("u1"))));

        tx.send_replace(None);
        assert_eq!(stream.next().await, Some(None));
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (tx, rx) = watch::channel(None);
        let mut stream = SessionStream::new(rx);
        assert_eq!(stream.next().await, Some(None));

        drop(tx);
        assert_eq!(stream.next().await, None);
    }
}
