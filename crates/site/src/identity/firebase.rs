//! Firebase Authentication over the Identity Toolkit REST API.
//!
//! Sign-in and sign-up exchange email and password for an ID token and a
//! refresh token. The ID token is refreshed through the Secure Token API one
//! minute before it expires; if a refresh fails the session ends and
//! subscribers see `None`. The refresh token is the credential the browser
//! caches between visits.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use club_core::{Email, IdentityRef, Session};

use super::{AuthError, IdentityProvider, Result, SessionStream, TokenSource};
use crate::config::FirebaseConfig;

/// How long before expiry the ID token is refreshed.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the provider omits or garbles `expiresIn`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

struct Tokens {
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: Instant,
}

struct Inner {
    http: reqwest::Client,
    config: FirebaseConfig,
    sessions: watch::Sender<Option<Session>>,
    tokens: RwLock<Option<Tokens>>,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.refresher.get_mut().take() {
            handle.abort();
        }
    }
}

/// Identity handle backed by Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseIdentity {
    inner: Arc<Inner>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    id_token: String,
    email: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
    local_id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
    user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// Client
// =============================================================================

impl FirebaseIdentity {
    /// Create a signed-out handle.
    #[must_use]
    pub fn new(http: reqwest::Client, config: FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                sessions: watch::Sender::new(None),
                tokens: RwLock::new(None),
                refresher: Mutex::new(None),
            }),
        }
    }

    async fn password_exchange(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        let email = Email::parse(email)?;
        let url = self.inner.accounts_url(action);
        let request = PasswordRequest {
            email: email.as_str(),
            password,
            return_secure_token: true,
        };

        let response = self.inner.http.post(&url).json(&request).send().await?;
        let account: AccountResponse = decode(response).await?;

        let session = Session::new(
            IdentityRef::new(account.local_id),
            Email::parse(&account.email).unwrap_or(email),
        );
        let tokens = Tokens::issue(account.id_token, account.refresh_token, &account.expires_in);
        self.install(tokens, session.clone()).await;

        tracing::info!(identity = %session.identity, "Signed in");
        Ok(session)
    }

    /// Store tokens, announce the session and restart the refresh timer.
    async fn install(&self, tokens: Tokens, session: Session) {
        *self.inner.tokens.write().await = Some(tokens);
        self.inner.sessions.send_replace(Some(session));

        let mut slot = self.inner.refresher.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(spawn_refresher(Arc::downgrade(&self.inner)));
    }
}

impl Inner {
    fn accounts_url(&self, action: &str) -> String {
        format!(
            "{}/v1/accounts:{action}?key={}",
            self.config.identity_url.as_str().trim_end_matches('/'),
            urlencoding::encode(self.config.api_key.expose_secret())
        )
    }

    fn token_url(&self) -> String {
        format!(
            "{}/v1/token?key={}",
            self.config.token_url.as_str().trim_end_matches('/'),
            urlencoding::encode(self.config.api_key.expose_secret())
        )
    }

    /// Exchange a refresh token for fresh tokens.
    async fn exchange_refresh_token(&self, refresh_token: &SecretString) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        let response = self.http.post(self.token_url()).form(&form).send().await?;
        decode(response).await
    }

    /// Refresh the ID token of the current session in place.
    async fn refresh(&self) -> Result<()> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
            .ok_or(AuthError::SessionExpired)?;

        let refreshed = self.exchange_refresh_token(&refresh_token).await?;
        *self.tokens.write().await = Some(Tokens::issue(
            refreshed.id_token,
            refreshed.refresh_token,
            &refreshed.expires_in,
        ));
        tracing::debug!(identity = %refreshed.user_id, "ID token refreshed");
        Ok(())
    }

    async fn time_until_refresh(&self) -> Option<Duration> {
        let tokens = self.tokens.read().await;
        let expires_at = tokens.as_ref()?.expires_at;
        Some(
            expires_at
                .saturating_duration_since(Instant::now())
                .saturating_sub(REFRESH_MARGIN),
        )
    }

    async fn end_session(&self) {
        *self.tokens.write().await = None;
        self.sessions.send_replace(None);
    }
}

impl Tokens {
    fn issue(id_token: String, refresh_token: String, expires_in: &str) -> Self {
        let lifetime = expires_in
            .parse::<u64>()
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        Self {
            id_token: SecretString::from(id_token),
            refresh_token: SecretString::from(refresh_token),
            expires_at: Instant::now() + lifetime,
        }
    }
}

/// Keep the ID token fresh until the session ends or the handle is dropped.
fn spawn_refresher(inner: Weak<Inner>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = match inner.upgrade() {
                Some(strong) => strong.time_until_refresh().await,
                None => None,
            };
            let Some(wait) = wait else {
                return;
            };

            tokio::time::sleep(wait).await;

            let Some(strong) = inner.upgrade() else {
                return;
            };
            if let Err(err) = strong.refresh().await {
                tracing::warn!(error = %err, "ID token refresh failed, ending session");
                strong.end_session().await;
                return;
            }
        }
    })
}

/// Decode a successful response body or map the provider error.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => Err(AuthError::from_provider_code(&envelope.error.message)),
        Err(_) => Err(AuthError::Provider(format!("HTTP {}", status.as_u16()))),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    fn current_session(&self) -> Option<Session> {
        self.inner.sessions.borrow().clone()
    }

    fn subscribe(&self) -> SessionStream {
        SessionStream::new(self.inner.sessions.subscribe())
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.password_exchange("signInWithPassword", email, password)
            .await
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        self.password_exchange("signUp", email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(handle) = self.inner.refresher.lock().await.take() {
            handle.abort();
        }
        self.inner.end_session().await;
        tracing::info!("Signed out");
        Ok(())
    }

    async fn is_privileged(&self, identity: &IdentityRef) -> bool {
        let url = format!(
            "{}/admins/{}",
            self.inner.config.documents_url(),
            urlencoding::encode(identity.as_str())
        );

        let mut request = self.inner.http.get(&url);
        if let Some(token) = self.bearer_token().await {
            request = request.bearer_auth(token.expose_secret());
        }

        match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) if response.status() == StatusCode::NOT_FOUND => false,
            Ok(response) => {
                tracing::warn!(
                    identity = %identity,
                    status = response.status().as_u16(),
                    "Privilege lookup rejected, treating as not privileged"
                );
                false
            }
            Err(err) => {
                tracing::warn!(identity = %identity, error = %err, "Privilege lookup failed, treating as not privileged");
                false
            }
        }
    }

    async fn restore(&self, credential: &SecretString) -> Result<Session> {
        let refreshed = self.inner.exchange_refresh_token(credential).await?;

        let lookup_url = self.inner.accounts_url("lookup");
        let response = self
            .inner
            .http
            .post(&lookup_url)
            .json(&LookupRequest {
                id_token: &refreshed.id_token,
            })
            .send()
            .await?;
        let lookup: LookupResponse = decode(response).await?;

        let user = lookup
            .users
            .into_iter()
            .find(|user| user.local_id == refreshed.user_id)
            .ok_or(AuthError::SessionExpired)?;
        let email = user
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()?
            .ok_or_else(|| AuthError::Malformed("account has no email".to_string()))?;

        let session = Session::new(IdentityRef::new(user.local_id), email);
        let tokens = Tokens::issue(
            refreshed.id_token,
            refreshed.refresh_token,
            &refreshed.expires_in,
        );
        self.install(tokens, session.clone()).await;

        tracing::info!(identity = %session.identity, "Session restored");
        Ok(session)
    }

    async fn credential(&self) -> Option<SecretString> {
        self.inner
            .tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
    }
}

#[async_trait]
impl TokenSource for FirebaseIdentity {
    async fn bearer_token(&self) -> Option<SecretString> {
        self.inner
            .tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.id_token.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity() -> FirebaseIdentity {
        FirebaseIdentity::new(
            reqwest::Client::new(),
            FirebaseConfig {
                api_key: SecretString::from("AIzaSyDpLk3uxRRXfNM+hYaX9ERedUNQSBRa0"),
                project_id: "club-main".to_string(),
                identity_url: "http://localhost:9099/identitytoolkit.googleapis.com"
                    .parse()
                    .unwrap(),
                token_url: "https://securetoken.googleapis.com".parse().unwrap(),
                firestore_url: "https://firestore.googleapis.com".parse().unwrap(),
            },
        )
    }

    #[test]
    fn test_accounts_url_keeps_emulator_prefix_and_encodes_key() {
        let url = identity().inner.accounts_url("signUp");
        assert_eq!(
            url,
            "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signUp?key=AIzaSyDpLk3uxRRXfNM%2BhYaX9ERedUNQSBRa0"
        );
    }

    #[test]
    fn test_token_url() {
        let url = identity().inner.token_url();
        assert!(url.starts_with("https://securetoken.googleapis.com/v1/token?key="));
    }

    #[test]
    fn test_token_lifetime_parsing() {
        let tokens = Tokens::issue("id".into(), "refresh".into(), "3600");
        let remaining = tokens.expires_at - Instant::now();
        assert!(remaining <= Duration::from_secs(3600));
        assert!(remaining > Duration::from_secs(3500));

        let fallback = Tokens::issue("id".into(), "refresh".into(), "soon");
        assert!(fallback.expires_at - Instant::now() > Duration::from_secs(3500));
    }

    #[tokio::test]
    async fn test_signed_out_handle_has_no_credential() {
        let identity = identity();
        assert!(identity.current_session().is_none());
        assert!(identity.credential().await.is_none());
        assert!(identity.bearer_token().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_announces_absence() {
        let identity = identity();
        let mut stream = identity.subscribe();
        assert_eq!(stream.next().await, Some(None));

        identity.sign_out().await.unwrap();
        assert_eq!(stream.next().await, Some(None));
    }

    #[test]
    fn test_account_response_shape() {
        let account: AccountResponse = serde_json::from_value(serde_json::json!({
            "kind": "identitytoolkit#SignupNewUserResponse",
            "idToken": "eyJ...",
            "email": "member@club.org",
            "refreshToken": "AMf-...",
            "expiresIn": "3600",
            "localId": "uid-1"
        }))
        .unwrap();
        assert_eq!(account.local_id, "uid-1");
        assert_eq!(account.expires_in, "3600");
    }
}
