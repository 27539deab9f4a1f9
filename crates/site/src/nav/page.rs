//! What the main area shows.

use club_core::{Route, Session};

/// The page selected for rendering.
///
/// Gated pages carry the session they were granted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    /// The session check has not completed yet.
    Loading,
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
    Portal(Session),
    Admin(Session),
}

impl PageView {
    /// The public page for a route, `None` for gated routes.
    #[must_use]
    pub const fn public(route: Route) -> Option<Self> {
        Some(match route {
            Route::Home => Self::Home,
            Route::About => Self::About,
            Route::Committee => Self::Committee,
            Route::Events => Self::Events,
            Route::Publications => Self::Publications,
            Route::Gallery => Self::Gallery,
            Route::Partners => Self::Partners,
            Route::Join => Self::Join,
            Route::Contact => Self::Contact,
            Route::Login => Self::Login,
            Route::Register => Self::Register,
            Route::Portal | Route::Admin => return None,
        })
    }

    /// Whether the page shows content fetched from the store.
    #[must_use]
    pub const fn loads_content(&self) -> bool {
        matches!(
            self,
            Self::Home
                | Self::About
                | Self::Committee
                | Self::Events
                | Self::Publications
                | Self::Gallery
                | Self::Partners
        )
    }

    /// Short name used in logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
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
            Self::Portal(_) => "portal",
            Self::Admin(_) => "admin",
        }
    }
}
