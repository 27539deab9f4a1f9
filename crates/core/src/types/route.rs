//! Logical pages and the URL fragment protocol.
//!
//! A route is encoded in the address bar as `#<token>`, where the token is the
//! lowercase route name (`#events`, `#admin`). Parsing a fragment never fails:
//! anything outside the closed set resolves to a [`FragmentResolution::Fallback`]
//! which callers normalize to [`Route::Home`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// A logical page of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    #[default]
    Home,
    About,
    Committee,
    Events,
    Publications,
    Gallery,
    Partners,
    Join,
    Contact,
    Login,
    Register,
    Portal,
    Admin,
}

/// Outcome of resolving a raw URL fragment against the route set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentResolution {
    /// The fragment names a route.
    Recognized(Route),
    /// The fragment is empty or unknown; the raw token is kept for logging.
    Fallback(String),
}

impl FragmentResolution {
    /// The route to display: the recognized one, or [`Route::Home`].
    #[must_use]
    pub const fn route(&self) -> Route {
        match self {
            Self::Recognized(route) => *route,
            Self::Fallback(_) => Route::Home,
        }
    }
}

impl Route {
    /// Every route, in navigation order.
    pub const ALL: [Self; 13] = [
        Self::Home,
        Self::About,
        Self::Committee,
        Self::Events,
        Self::Publications,
        Self::Gallery,
        Self::Partners,
        Self::Join,
        Self::Contact,
        Self::Login,
        Self::Register,
        Self::Portal,
        Self::Admin,
    ];

    /// The fragment token (without `#`).
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::About => "about",
            Self::Committee => "committee",
            Self::Events => "events",
            Self::Publications => "publications",
            Self::Gallery => "gallery",
            Self::Partners => "partners",
            Self::Join => "join",
            Self::Contact => "contact",
            Self::Login => "login",
            Self::Register => "register",
            Self::Portal => "portal",
            Self::Admin => "admin",
        }
    }

    /// The full fragment including the leading `#`.
    #[must_use]
    pub fn fragment(self) -> String {
        format!("#{}", self.token())
    }

    /// Look up a route by its exact token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.token() == token)
    }

    /// Resolve a raw fragment as read from the address bar.
    ///
    /// One leading `#` is stripped and the remainder is lowercased before it
    /// is matched against the route tokens.
    ///
    /// ```
    /// use club_core::{FragmentResolution, Route};
    ///
    /// assert_eq!(Route::resolve("#Events"), FragmentResolution::Recognized(Route::Events));
    /// assert_eq!(Route::resolve("#bogus").route(), Route::Home);
    /// assert_eq!(Route::resolve("").route(), Route::Home);
    /// ```
    #[must_use]
    pub fn resolve(raw: &str) -> FragmentResolution {
        let token = raw.strip_prefix('#').unwrap_or(raw).to_lowercase();
        match Self::from_token(&token) {
            Some(route) => FragmentResolution::Recognized(route),
            None => FragmentResolution::Fallback(token),
        }
    }

    /// Whether the page is reachable without any session.
    #[must_use]
    pub const fn is_public(self) -> bool {
        !matches!(self, Self::Portal | Self::Admin)
    }

    /// Human-readable label used in navigation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::About => "About",
            Self::Committee => "Committee",
            Self::Events => "Events",
            Self::Publications => "Publications",
            Self::Gallery => "Gallery",
            Self::Partners => "Partners",
            Self::Join => "Join Us",
            Self::Contact => "Contact",
            Self::Login => "Portal Login",
            Self::Register => "Register",
            Self::Portal => "Portal",
            Self::Admin => "Admin Panel",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
