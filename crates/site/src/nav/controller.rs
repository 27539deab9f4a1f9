//! The navigation and session state machine.

use club_core::{FragmentResolution, IdentityRef, Route, Session};

use super::PageView;

/// Identifies one privilege lookup.
///
/// The generation increases on every session change, so a tag only matches
/// the lookup issued for the most recent change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupTag {
    generation: u64,
    identity: IdentityRef,
}

impl LookupTag {
    /// Identity the lookup was issued for.
    #[must_use]
    pub const fn identity(&self) -> &IdentityRef {
        &self.identity
    }

    /// Session-change generation the lookup belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Instruction returned by a transition, performed by the caller in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write this fragment (with `#`) into the address bar.
    SetFragment(String),
    /// Scroll the window to the top.
    ScrollToTop,
    /// Ask the identity provider whether the tagged identity is privileged
    /// and report back through [`Controller::on_privilege_resolved`].
    LookupPrivilege(LookupTag),
}

/// Observable controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    pub route: Route,
    pub session: Option<Session>,
    pub privilege: bool,
    pub session_checked: bool,
}

/// Single authority for route, session, privilege and gating.
#[derive(Debug)]
pub struct Controller {
    state: NavState,
    generation: u64,
    pending: Option<LookupTag>,
    notified: bool,
}

impl Controller {
    /// Build the controller from the address bar and the identity snapshot.
    ///
    /// An unknown or empty fragment selects [`Route::Home`] and is rewritten
    /// to `#home`; a recognized one in another spelling is rewritten to its
    /// canonical token. A present snapshot issues one privilege lookup. The caller
    /// subscribes to session changes afterwards; until the first
    /// notification is processed every page resolves to
    /// [`PageView::Loading`].
    #[must_use]
    pub fn initialize(fragment: &str, snapshot: Option<Session>) -> (Self, Vec<Effect>) {
        let mut effects = Vec::new();

        let route = match Route::resolve(fragment) {
            FragmentResolution::Recognized(route) => {
                if fragment != route.fragment() {
                    effects.push(Effect::SetFragment(route.fragment()));
                }
                route
            }
            FragmentResolution::Fallback(raw) => {
                tracing::debug!(fragment = %raw, "Unrecognized initial fragment, using home");
                effects.push(Effect::SetFragment(Route::Home.fragment()));
                Route::Home
            }
        };

        let mut controller = Self {
            state: NavState {
                route,
                session: None,
                privilege: false,
                session_checked: false,
            },
            generation: 0,
            pending: None,
            notified: false,
        };
        if let Some(effect) = controller.adopt_session(snapshot) {
            effects.push(effect);
        }

        (controller, effects)
    }

    /// Handle a session-change notification.
    ///
    /// Privilege drops to `false` until the lookup for this change answers.
    /// Without a session no lookup is issued and the session check completes
    /// immediately.
    pub fn on_session_changed(&mut self, session: Option<Session>) -> Vec<Effect> {
        self.notified = true;
        let effect = self.adopt_session(session);

        if self.state.session.is_none() {
            self.state.session_checked = true;
        }

        effect.into_iter().collect()
    }

    /// Request a page. Only writes the fragment; resolution and gating
    /// happen when the fragment change comes back.
    #[must_use]
    pub fn navigate_to(&self, route: Route) -> Vec<Effect> {
        vec![Effect::SetFragment(route.fragment())]
    }

    /// Handle a fragment change reported by the address bar.
    ///
    /// A recognized fragment in a non-canonical spelling is rewritten without
    /// scrolling; the scroll happens when the canonical fragment comes back.
    pub fn on_fragment_changed(&mut self, raw: &str) -> Vec<Effect> {
        match Route::resolve(raw) {
            FragmentResolution::Recognized(route) => {
                self.state.route = route;
                if raw == route.fragment() {
                    vec![Effect::ScrollToTop]
                } else {
                    vec![Effect::SetFragment(route.fragment())]
                }
            }
            FragmentResolution::Fallback(token) => {
                tracing::debug!(fragment = %token, "Unrecognized fragment, rewriting to home");
                self.state.route = Route::Home;
                vec![Effect::SetFragment(Route::Home.fragment())]
            }
        }
    }

    /// Apply a privilege answer.
    ///
    /// Returns `false` and changes nothing when the tag belongs to a
    /// superseded session change.
    pub fn on_privilege_resolved(&mut self, tag: &LookupTag, privileged: bool) -> bool {
        if self.pending.as_ref() != Some(tag) {
            tracing::debug!(
                generation = tag.generation,
                current = self.generation,
                "Discarding stale privilege result"
            );
            return false;
        }

        self.pending = None;
        self.state.privilege = privileged;
        if self.notified {
            self.state.session_checked = true;
        }
        true
    }

    /// Where to go after a successful sign-in or sign-up.
    #[must_use]
    pub fn on_auth_success(&self, privileged: bool) -> Vec<Effect> {
        self.navigate_to(Self::auth_target(privileged))
    }

    /// Route requested after authentication.
    #[must_use]
    pub const fn auth_target(privileged: bool) -> Route {
        if privileged {
            Route::Admin
        } else {
            Route::Portal
        }
    }

    /// The page to render for the current state.
    #[must_use]
    pub fn page(&self) -> PageView {
        resolve_page(
            self.state.route,
            self.state.session.as_ref(),
            self.state.privilege,
            self.state.session_checked,
        )
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &NavState {
        &self.state
    }

    /// Tag of the lookup whose answer is still awaited.
    #[must_use]
    pub const fn pending_lookup(&self) -> Option<&LookupTag> {
        self.pending.as_ref()
    }

    fn adopt_session(&mut self, session: Option<Session>) -> Option<Effect> {
        self.generation += 1;
        self.state.privilege = false;
        self.state.session = session;

        self.pending = self.state.session.as_ref().map(|session| LookupTag {
            generation: self.generation,
            identity: session.identity.clone(),
        });
        self.pending.clone().map(Effect::LookupPrivilege)
    }
}

/// Decide what to render.
///
/// Gated routes without sufficient rights show the login page in place,
/// without touching the fragment.
#[must_use]
pub fn resolve_page(
    route: Route,
    session: Option<&Session>,
    privilege: bool,
    session_checked: bool,
) -> PageView {
    if !session_checked {
        return PageView::Loading;
    }

    match (route, session) {
        (Route::Portal, Some(session)) => PageView::Portal(session.clone()),
        (Route::Admin, Some(session)) if privilege => PageView::Admin(session.clone()),
        (Route::Portal | Route::Admin, _) => PageView::Login,
        (route, _) => PageView::public(route).unwrap_or(PageView::Home),
    }
}
