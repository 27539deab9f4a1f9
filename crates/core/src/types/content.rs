//! Content records stored in the document database.
//!
//! Field names follow the stored documents (camelCase), so records can be read
//! from and written to the backend without a mapping layer.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{DocumentId, Email};

/// A named collection in the document database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "committees")]
    Committees,
    #[serde(rename = "advisors")]
    Advisors,
    #[serde(rename = "publications")]
    Publications,
    #[serde(rename = "galleryItems")]
    GalleryItems,
    #[serde(rename = "partners")]
    Partners,
    #[serde(rename = "messages")]
    Messages,
    #[serde(rename = "admins")]
    Admins,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 8] = [
        Self::Events,
        Self::Committees,
        Self::Advisors,
        Self::Publications,
        Self::GalleryItems,
        Self::Partners,
        Self::Messages,
        Self::Admins,
    ];

    /// The collection path segment used by the backend.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Committees => "committees",
            Self::Advisors => "advisors",
            Self::Publications => "publications",
            Self::GalleryItems => "galleryItems",
            Self::Partners => "partners",
            Self::Messages => "messages",
            Self::Admins => "admins",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.path().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

/// A record type bound to its collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the record lives in.
    const COLLECTION: Collection;
}

/// A record together with its document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: DocumentId,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    #[must_use]
    pub const fn new(id: DocumentId, record: T) -> Self {
        Self { id, record }
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventCategory {
    Music,
    Drama,
    Debate,
    #[default]
    Workshop,
    Festival,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Past,
}

impl EventCategory {
    pub const ALL: [Self; 5] = [
        Self::Music,
        Self::Drama,
        Self::Debate,
        Self::Workshop,
        Self::Festival,
    ];

    /// Stored value, also used as display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Music => "Music",
            Self::Drama => "Drama",
            Self::Debate => "Debate",
            Self::Workshop => "Workshop",
            Self::Festival => "Festival",
        }
    }
}

impl EventStatus {
    pub const ALL: [Self; 2] = [Self::Upcoming, Self::Past];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Past => "past",
        }
    }
}

/// A club event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub title: String,
    /// Free-form display date, e.g. `25 DEC 2024`.
    pub date: String,
    pub venue: String,
    pub description: String,
    pub image_url: String,
    pub category: EventCategory,
    pub status: EventStatus,
}

impl Record for Event {
    const COLLECTION: Collection = Collection::Events;
}

// =============================================================================
// People
// =============================================================================

/// Social profile links of a committee member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Socials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

/// A committee member for a given year.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub role: String,
    pub photo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub socials: Socials,
}

impl Member {
    /// Roles listed ahead of everyone else, in this order.
    pub const LEADERSHIP_ROLES: [&'static str; 3] =
        ["President", "Vice President", "General Secretary"];

    /// Position of the member's role among the leadership roles.
    #[must_use]
    pub fn leadership_rank(&self) -> Option<usize> {
        Self::LEADERSHIP_ROLES
            .iter()
            .position(|role| role.eq_ignore_ascii_case(self.role.trim()))
    }
}

impl Record for Member {
    const COLLECTION: Collection = Collection::Committees;
}

/// A faculty advisor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisor {
    pub name: String,
    pub designation: String,
    pub photo_url: String,
}

impl Record for Advisor {
    const COLLECTION: Collection = Collection::Advisors;
}

// =============================================================================
// Publications, gallery, partners
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PublicationCategory {
    #[default]
    Literature,
    Opinion,
    Culture,
}

impl PublicationCategory {
    pub const ALL: [Self; 3] = [Self::Literature, Self::Opinion, Self::Culture];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Literature => "Literature",
            Self::Opinion => "Opinion",
            Self::Culture => "Culture",
        }
    }
}

/// A magazine issue or article.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub title: String,
    pub author: String,
    pub category: PublicationCategory,
    pub image_url: String,
    pub excerpt: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl Record for Publication {
    const COLLECTION: Collection = Collection::Publications;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Photo,
    Video,
}

impl MediaType {
    pub const ALL: [Self; 2] = [Self::Photo, Self::Video];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

/// A photo or video from a past event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GalleryItem {
    pub title: String,
    pub event: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
}

impl Record for GalleryItem {
    const COLLECTION: Collection = Collection::GalleryItems;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    #[default]
    Institutional,
    Sponsor,
    Media,
}

impl PartnerType {
    pub const ALL: [Self; 3] = [Self::Institutional, Self::Sponsor, Self::Media];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Institutional => "institutional",
            Self::Sponsor => "sponsor",
            Self::Media => "media",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Institutional => "Institutional Partners",
            Self::Sponsor => "Sponsors",
            Self::Media => "Media Partners",
        }
    }
}

/// An institutional partner, sponsor or media partner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub name: String,
    pub description: String,
    pub logo_url: String,
    #[serde(rename = "type")]
    pub partner_type: PartnerType,
}

impl Record for Partner {
    const COLLECTION: Collection = Collection::Partners;
}

// =============================================================================
// Contact messages
// =============================================================================

/// A message submitted through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ContactMessage {
    /// Build a message stamped with the current time.
    #[must_use]
    pub fn now(name: impl Into<String>, email: Email, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl Record for ContactMessage {
    const COLLECTION: Collection = Collection::Messages;
}
