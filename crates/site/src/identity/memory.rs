//! In-process identity provider for local development and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, watch};

use club_core::{Email, IdentityRef, Session};

use super::{AuthError, IdentityProvider, Result, SessionStream};

/// Minimum password length accepted by the directory (matches the hosted
/// provider's rule).
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    identity: IdentityRef,
    email: Email,
    password_hash: String,
}

#[derive(Default)]
struct DirectoryInner {
    accounts: RwLock<HashMap<Email, Account>>,
    admins: RwLock<HashSet<IdentityRef>>,
    refresh_tokens: RwLock<HashMap<String, IdentityRef>>,
    privilege_latency: RwLock<Duration>,
    privilege_lookups: AtomicUsize,
    fail_privilege_lookups: AtomicBool,
    fail_sign_outs: AtomicBool,
}

/// Shared account directory.
///
/// One directory backs every [`MemoryIdentity`] handle of a process, the
/// same way one hosted project backs every browser.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<DirectoryInner>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account directly, without signing anyone in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the email is invalid, the password is too weak,
    /// or the account already exists.
    pub async fn register(&self, email: &str, password: &str) -> Result<IdentityRef> {
        self.create_account(email, password)
            .await
            .map(|account| account.identity)
    }

    /// Grant admin privilege to an identity.
    pub async fn grant_admin(&self, identity: &IdentityRef) {
        self.inner.admins.write().await.insert(identity.clone());
    }

    /// Revoke admin privilege from an identity.
    pub async fn revoke_admin(&self, identity: &IdentityRef) {
        self.inner.admins.write().await.remove(identity);
    }

    /// Number of privilege lookups performed so far.
    #[must_use]
    pub fn privilege_lookups(&self) -> usize {
        self.inner.privilege_lookups.load(Ordering::SeqCst)
    }

    /// Delay every privilege lookup by `latency`.
    pub async fn set_privilege_latency(&self, latency: Duration) {
        *self.inner.privilege_latency.write().await = latency;
    }

    /// Make privilege lookups fail (they then report `false`).
    pub fn fail_privilege_lookups(&self, fail: bool) {
        self.inner
            .fail_privilege_lookups
            .store(fail, Ordering::SeqCst);
    }

    /// Make sign-out calls fail with a transport-like error.
    pub fn fail_sign_outs(&self, fail: bool) {
        self.inner.fail_sign_outs.store(fail, Ordering::SeqCst);
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Account> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let mut accounts = self.inner.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::UserAlreadyExists);
        }

        let account = Account {
            identity: IdentityRef::new(uuid::Uuid::new_v4().simple().to_string()),
            email: email.clone(),
            password_hash: hash_password(password)?,
        };
        accounts.insert(email, account.clone());
        Ok(account)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Account> {
        let email = Email::parse(email)?;
        let account = self
            .inner
            .accounts
            .read()
            .await
            .get(&email)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;
        Ok(account)
    }

    async fn account_by_identity(&self, identity: &IdentityRef) -> Option<Account> {
        self.inner
            .accounts
            .read()
            .await
            .values()
            .find(|account| &account.identity == identity)
            .cloned()
    }

    async fn issue_refresh_token(&self, identity: &IdentityRef) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.inner
            .refresh_tokens
            .write()
            .await
            .insert(token.clone(), identity.clone());
        token
    }
}

/// Per-tab identity handle over a [`MemoryDirectory`].
pub struct MemoryIdentity {
    directory: MemoryDirectory,
    sessions: watch::Sender<Option<Session>>,
    refresh_token: RwLock<Option<String>>,
}

impl MemoryIdentity {
    /// Create a signed-out handle.
    #[must_use]
    pub fn new(directory: MemoryDirectory) -> Self {
        Self {
            directory,
            sessions: watch::Sender::new(None),
            refresh_token: RwLock::new(None),
        }
    }

    async fn establish(&self, account: Account) -> Session {
        let token = self.directory.issue_refresh_token(&account.identity).await;
        *self.refresh_token.write().await = Some(token);

        let session = Session::new(account.identity, account.email);
        self.sessions.send_replace(Some(session.clone()));
        session
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn current_session(&self) -> Option<Session> {
        self.sessions.borrow().clone()
    }

    fn subscribe(&self) -> SessionStream {
        SessionStream::new(self.sessions.subscribe())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let account = self.directory.authenticate(email, password).await?;
        Ok(self.establish(account).await)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let account = self.directory.create_account(email, password).await?;
        Ok(self.establish(account).await)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.directory.inner.fail_sign_outs.load(Ordering::SeqCst) {
            return Err(AuthError::Provider("NETWORK_REQUEST_FAILED".to_string()));
        }

        if let Some(token) = self.refresh_token.write().await.take() {
            self.directory
                .inner
                .refresh_tokens
                .write()
                .await
                .remove(&token);
        }
        self.sessions.send_replace(None);
        Ok(())
    }

    async fn is_privileged(&self, identity: &IdentityRef) -> bool {
        let inner = &self.directory.inner;
        inner.privilege_lookups.fetch_add(1, Ordering::SeqCst);

        let latency = *inner.privilege_latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if inner.fail_privilege_lookups.load(Ordering::SeqCst) {
            tracing::warn!(identity = %identity, "Privilege lookup failed, treating as not privileged");
            return false;
        }

        inner.admins.read().await.contains(identity)
    }

    async fn restore(&self, credential: &SecretString) -> Result<Session> {
        let identity = self
            .directory
            .inner
            .refresh_tokens
            .read()
            .await
            .get(credential.expose_secret())
            .cloned()
            .ok_or(AuthError::SessionExpired)?;

        let account = self
            .directory
            .account_by_identity(&identity)
            .await
            .ok_or(AuthError::SessionExpired)?;

        *self.refresh_token.write().await = Some(credential.expose_secret().to_string());
        let session = Session::new(account.identity, account.email);
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn credential(&self) -> Option<SecretString> {
        self.refresh_token
            .read()
            .await
            .clone()
            .map(SecretString::from)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password should be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Argon2id with light parameters; the directory only ever holds
/// development accounts.
fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(4096, 1, 1, None).map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    hasher()?
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
