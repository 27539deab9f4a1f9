//! One browser tab's live session.
//!
//! The session owns the navigation controller, the page state and the
//! identity handle of its tab. It consumes [`ClientMessage`]s, session-change
//! notifications and the results of its own background tasks, and answers
//! with [`ServerMessage`]s. Background work (sign-in, privilege lookups, page
//! loads, admin writes) runs in detached tasks that report back over a
//! channel. Tasks still running when the tab closes finish on their own and
//! their results are dropped.

use std::future::Future;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use sentry::{Hub, SentryFutureExt};
use tokio::sync::mpsc;

use club_core::{ContactMessage, Email, Route, Session};

use super::protocol::{ClientMessage, ServerMessage};
use crate::admin::{self, AdminAction, AdminCompletion, AdminState, AdminTask};
use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::identity::{AuthError, IdentityProvider, SessionStream};
use crate::nav::{Controller, Effect, LookupTag, PageView};
use crate::pages::{
    self, AuthForm, ContactForm, ContactStatus, Load, MainContext, PageData, render_header,
    render_main,
};
use crate::store::{ContentStore, Records, StoreError};

/// The browser went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Disconnected;

type Outcome = Result<(), Disconnected>;

/// Result of a background task.
#[derive(Debug)]
enum Completion {
    Privilege {
        tag: LookupTag,
        privileged: bool,
    },
    SignedIn(Result<bool, AuthError>),
    SignedUp(Result<bool, AuthError>),
    SignedOut(Result<(), AuthError>),
    PageLoaded {
        epoch: u64,
        result: Result<PageData, StoreError>,
    },
    ContactSent(Result<(), StoreError>),
    Admin(AdminCompletion),
}

/// State of a connected tab.
pub struct LiveSession {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn ContentStore>,
    outbound: mpsc::Sender<ServerMessage>,
    controller: Controller,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    known_session: Option<Session>,
    page: Option<PageView>,
    epoch: u64,
    data: Load<PageData>,
    login: AuthForm,
    register: AuthForm,
    contact: ContactForm,
    admin: AdminState,
    /// Route requested after a successful sign-in or sign-up, and whether it
    /// came from sign-up. That form stays pending until gating has settled.
    landing: Option<(Route, bool)>,
    rendered: Option<(String, String)>,
}

impl LiveSession {
    /// Drive a tab until either side hangs up.
    ///
    /// The first inbound message must be [`ClientMessage::Hello`]. A cached
    /// credential is restored before the controller is initialized so the
    /// initial snapshot already reflects it.
    pub async fn run(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn ContentStore>,
        mut inbound: mpsc::Receiver<ClientMessage>,
        outbound: mpsc::Sender<ServerMessage>,
    ) {
        let Some(first) = inbound.recv().await else {
            return;
        };
        let (fragment, credential) = match first {
            ClientMessage::Hello {
                fragment,
                credential,
            } => (fragment, credential),
            other => {
                tracing::warn!(kind = other.kind(), "Live session did not start with hello");
                return;
            }
        };

        let restored = match credential.filter(|c| !c.is_empty()) {
            Some(credential) => Some(identity.restore(&SecretString::from(credential)).await),
            None => None,
        };
        match &restored {
            Some(Ok(session)) => tracing::info!(user_id = %session.identity, "Restored session"),
            Some(Err(err)) => tracing::warn!(error = %err, "Could not restore session"),
            None => {}
        }

        let (controller, effects) = Controller::initialize(&fragment, identity.current_session());
        tracing::info!(route = %controller.state().route, "Live session started");

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mut session = Self {
            identity,
            store,
            outbound,
            controller,
            completions_tx,
            completions_rx,
            known_session: None,
            page: None,
            epoch: 0,
            data: Load::Pending,
            login: AuthForm::default(),
            register: AuthForm::default(),
            contact: ContactForm::default(),
            admin: AdminState::default(),
            landing: None,
            rendered: None,
        };

        let forget = matches!(restored, Some(Err(_)));
        if session.begin(effects, forget).await.is_ok()
            && session.event_loop(&mut inbound).await.is_err()
        {
            tracing::debug!("Browser disconnected");
        }
        tracing::info!(
            page = session.page.as_ref().map_or("none", PageView::name),
            "Live session ended"
        );
    }

    async fn begin(&mut self, effects: Vec<Effect>, forget_credential: bool) -> Outcome {
        if forget_credential {
            self.send(ServerMessage::Credential { token: None }).await?;
        }
        self.perform(effects).await?;
        self.sync().await
    }

    async fn event_loop(&mut self, inbound: &mut mpsc::Receiver<ClientMessage>) -> Outcome {
        let mut sessions: SessionStream = self.identity.subscribe();
        let mut sessions_open = true;

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else {
                        return Ok(());
                    };
                    self.on_message(message).await?;
                }
                change = sessions.next(), if sessions_open => {
                    match change {
                        Some(session) => self.on_session(session).await?,
                        None => sessions_open = false,
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.on_completion(completion).await?;
                }
            }
            self.sync().await?;
        }
    }

    async fn send(&self, message: ServerMessage) -> Outcome {
        self.outbound.send(message).await.map_err(|_| Disconnected)
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        tokio::spawn(
            async move {
                // The session may be gone; its results are not needed then.
                let _ = completions.send(task.await);
            }
            .bind_hub(Hub::current()),
        );
    }

    async fn perform(&mut self, effects: Vec<Effect>) -> Outcome {
        for effect in effects {
            match effect {
                Effect::SetFragment(fragment) => {
                    self.send(ServerMessage::SetFragment { fragment }).await?;
                }
                Effect::ScrollToTop => self.send(ServerMessage::ScrollTop).await?,
                Effect::LookupPrivilege(tag) => {
                    let identity = Arc::clone(&self.identity);
                    self.spawn(async move {
                        let privileged = identity.is_privileged(tag.identity()).await;
                        Completion::Privilege { tag, privileged }
                    });
                }
            }
        }
        Ok(())
    }

    async fn on_message(&mut self, message: ClientMessage) -> Outcome {
        tracing::debug!(kind = message.kind(), "Client message");
        match message {
            ClientMessage::Hello { .. } => {
                tracing::debug!("Ignoring repeated hello");
            }
            ClientMessage::FragmentChanged { fragment } => {
                let effects = self.controller.on_fragment_changed(&fragment);
                self.perform(effects).await?;
            }
            ClientMessage::Navigate { route } => {
                let effects = self.controller.navigate_to(route);
                self.perform(effects).await?;
            }
            ClientMessage::SignIn { email, password } => self.sign_in(&email, password),
            ClientMessage::SignUp {
                email,
                password,
                confirm_password,
            } => self.sign_up(&email, password, &confirm_password),
            ClientMessage::SignOut => {
                add_breadcrumb("auth", "Signing out", None);
                let identity = Arc::clone(&self.identity);
                self.spawn(async move { Completion::SignedOut(identity.sign_out().await) });
            }
            ClientMessage::SubmitContact {
                name,
                email,
                message,
            } => self.submit_contact(&name, &email, &message),
            ClientMessage::Admin { action } => self.admin_action(action),
        }
        Ok(())
    }

    fn sign_in(&mut self, email: &str, password: String) {
        if self.login.pending {
            return;
        }
        self.login.submit(email);
        let identity = Arc::clone(&self.identity);
        let email = self.login.email.clone();
        self.spawn(async move {
            Completion::SignedIn(authenticate(identity.as_ref(), &email, &password, false).await)
        });
    }

    fn sign_up(&mut self, email: &str, password: String, confirm_password: &str) {
        if self.register.pending {
            return;
        }
        self.register.submit(email);
        if password != confirm_password {
            self.register.fail("Passwords do not match.");
            return;
        }
        let identity = Arc::clone(&self.identity);
        let email = self.register.email.clone();
        self.spawn(async move {
            Completion::SignedUp(authenticate(identity.as_ref(), &email, &password, true).await)
        });
    }

    fn submit_contact(&mut self, name: &str, email: &str, message: &str) {
        if self.contact.is_sending() {
            return;
        }
        self.contact = ContactForm {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
            status: ContactStatus::Sending,
        };

        if self.contact.name.is_empty()
            || self.contact.email.is_empty()
            || self.contact.message.is_empty()
        {
            self.contact.status = ContactStatus::Failed("Please fill in all fields.".to_string());
            return;
        }
        let Ok(email) = Email::parse(&self.contact.email) else {
            self.contact.status =
                ContactStatus::Failed("Please enter a valid email address.".to_string());
            return;
        };

        let record = ContactMessage::now(&self.contact.name, email, &self.contact.message);
        let store = Arc::clone(&self.store);
        self.spawn(async move { Completion::ContactSent(store.insert(&record).await.map(|_| ())) });
    }

    fn admin_action(&mut self, action: AdminAction) {
        if !matches!(self.controller.page(), PageView::Admin(_)) {
            tracing::warn!("Ignoring admin action outside the admin page");
            return;
        }
        if let Some(task) = self.admin.apply(action) {
            self.run_admin(task);
        }
    }

    fn run_admin(&self, task: AdminTask) {
        let store = Arc::clone(&self.store);
        self.spawn(async move { Completion::Admin(admin::perform(task, store).await) });
    }

    async fn on_session(&mut self, session: Option<Session>) -> Outcome {
        let changed = self.known_session != session;
        self.known_session.clone_from(&session);

        if changed {
            match &session {
                Some(s) => {
                    set_sentry_user(&s.identity, Some(s.email.as_str()));
                    add_breadcrumb("auth", "Signed in", None);
                }
                None => {
                    clear_sentry_user();
                    add_breadcrumb("auth", "Signed out", None);
                }
            }
            let token = self
                .identity
                .credential()
                .await
                .map(|secret| secret.expose_secret().to_string());
            self.send(ServerMessage::Credential { token }).await?;
            self.admin = AdminState::default();
            self.contact = ContactForm::default();
        }

        let effects = self.controller.on_session_changed(session);
        self.perform(effects).await
    }

    async fn on_completion(&mut self, completion: Completion) -> Outcome {
        match completion {
            Completion::Privilege { tag, privileged } => {
                if !self.controller.on_privilege_resolved(&tag, privileged) {
                    tracing::debug!(
                        generation = tag.generation(),
                        "Discarding stale privilege result"
                    );
                }
            }
            Completion::SignedIn(result) => {
                return self.on_authenticated(result, false).await;
            }
            Completion::SignedUp(result) => {
                return self.on_authenticated(result, true).await;
            }
            Completion::SignedOut(result) => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "Sign out failed");
                }
                let effects = self.controller.navigate_to(Route::Home);
                self.perform(effects).await?;
            }
            Completion::PageLoaded { epoch, result } => {
                if epoch != self.epoch {
                    return Ok(());
                }
                self.data = match result {
                    Ok(data) => Load::Ready(data),
                    Err(err) => {
                        AppError::from(err).report();
                        Load::Failed("Could not load content. Please try again later.".to_string())
                    }
                };
            }
            Completion::ContactSent(result) => match result {
                Ok(()) => {
                    tracing::info!("Contact message stored");
                    self.contact = ContactForm {
                        status: ContactStatus::Sent,
                        ..ContactForm::default()
                    };
                }
                Err(err) => {
                    AppError::from(err).report();
                    self.contact.status = ContactStatus::Failed(
                        "Failed to send message. Please try again.".to_string(),
                    );
                }
            },
            Completion::Admin(completion) => {
                if let Some(task) = self.admin.on_completion(completion) {
                    self.run_admin(task);
                }
            }
        }
        Ok(())
    }

    async fn on_authenticated(
        &mut self,
        result: Result<bool, AuthError>,
        signed_up: bool,
    ) -> Outcome {
        match result {
            Ok(privileged) => {
                self.landing = Some((Controller::auth_target(privileged), signed_up));
                let effects = self.controller.on_auth_success(privileged);
                self.perform(effects).await
            }
            Err(err) => {
                tracing::warn!(error = %err, "Authentication failed");
                let form = if signed_up {
                    &mut self.register
                } else {
                    &mut self.login
                };
                form.fail(err.user_message());
                Ok(())
            }
        }
    }

    /// Bring page data and the browser in line with the controller.
    async fn sync(&mut self) -> Outcome {
        let page = self.controller.page();
        self.settle_landing(&page);
        if self.page.as_ref() != Some(&page) {
            tracing::debug!(page = page.name(), "Entering page");
            add_breadcrumb("navigation", "Entered page", Some(&[("page", page.name())]));

            let was_admin = matches!(self.page, Some(PageView::Admin(_)));
            self.epoch += 1;
            if page.loads_content() {
                self.data = Load::Pending;
                let (epoch, store, target) = (self.epoch, Arc::clone(&self.store), page.clone());
                self.spawn(async move {
                    Completion::PageLoaded {
                        epoch,
                        result: pages::load(&target, store.as_ref()).await,
                    }
                });
            } else {
                self.data = Load::Ready(PageData::Static);
            }
            if matches!(page, PageView::Admin(_)) && !was_admin {
                let task = self.admin.enter();
                self.run_admin(task);
            }
            self.page = Some(page);
        }

        self.render().await
    }

    /// Release the auth forms once the page requested after sign-in has
    /// been resolved, or gating for it has answered.
    fn settle_landing(&mut self, page: &PageView) {
        let Some((target, signed_up)) = self.landing else {
            return;
        };
        let gated =
            self.controller.state().route == target && self.controller.pending_lookup().is_none();
        if gated || !matches!(page, PageView::Login | PageView::Register) {
            self.landing = None;
            if signed_up {
                self.register.reset();
            } else {
                self.login.reset();
            }
        }
    }

    async fn render(&mut self) -> Outcome {
        let Some(page) = &self.page else {
            return Ok(());
        };
        let rendered = render_header(self.controller.state()).and_then(|header| {
            let main = render_main(&MainContext {
                view: page,
                data: &self.data,
                login: &self.login,
                register: &self.register,
                contact: &self.contact,
                admin: &self.admin,
            })?;
            Ok((header, main))
        });

        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(err) => {
                AppError::from(err).report();
                return Ok(());
            }
        };
        if self.rendered.as_ref() == Some(&rendered) {
            return Ok(());
        }
        self.rendered = Some(rendered.clone());
        let (header, main) = rendered;
        self.send(ServerMessage::Render { header, main }).await
    }
}

/// Sign in or sign up, then ask whether the new session is privileged.
async fn authenticate(
    identity: &dyn IdentityProvider,
    email: &str,
    password: &str,
    create: bool,
) -> Result<bool, AuthError> {
    let session = if create {
        identity.sign_up(email, password).await?
    } else {
        identity.sign_in(email, password).await?
    };
    Ok(identity.is_privileged(&session.identity).await)
}
