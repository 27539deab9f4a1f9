//! Page data and rendering.
//!
//! Pages render already-fetched data. Each page that shows content has a
//! loader in [`data`]; the live session runs it when the page is entered and
//! renders [`Load::Pending`] until the result arrives.

mod data;
mod forms;
mod render;

pub use data::{
    AboutData, CommitteeYear, EventsData, GalleryYear, HomeData, PageData, PartnerGroup,
    PublicationsData, committee_years, load,
};
pub use forms::{AuthForm, ContactForm, ContactStatus};
pub use render::{MainContext, ShellTemplate, render_header, render_main};

/// Progress of an asynchronous load.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Load<T> {
    #[default]
    Pending,
    Ready(T),
    /// Message shown in place of the content.
    Failed(String),
}

impl<T> Load<T> {
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}
