//! Admin sections and their form declarations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use club_core::{
    Advisor, Collection, ContactMessage, Event, EventCategory, EventStatus, GalleryItem, MediaType,
    Member, Partner, PartnerType, Publication, PublicationCategory, Record,
};

use crate::store::{self, Fields};

/// A tab of the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Events,
    Committee,
    Advisors,
    Publications,
    Gallery,
    Partners,
    Messages,
}

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Url,
    Number,
    Checkbox,
    Select(&'static [&'static str]),
}

/// One input of a section's form.
///
/// `name` is a dotted path into the record (`socials.linkedin`).
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// One column of a section's table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub label: &'static str,
    pub path: &'static str,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: false,
    }
}

const fn column(label: &'static str, path: &'static str) -> Column {
    Column { label, path }
}

const EVENT_CATEGORIES: [&str; 5] = [
    EventCategory::Music.as_str(),
    EventCategory::Drama.as_str(),
    EventCategory::Debate.as_str(),
    EventCategory::Workshop.as_str(),
    EventCategory::Festival.as_str(),
];
const EVENT_STATUSES: [&str; 2] = [EventStatus::Upcoming.as_str(), EventStatus::Past.as_str()];
const PUBLICATION_CATEGORIES: [&str; 3] = [
    PublicationCategory::Literature.as_str(),
    PublicationCategory::Opinion.as_str(),
    PublicationCategory::Culture.as_str(),
];
const MEDIA_TYPES: [&str; 2] = [MediaType::Photo.as_str(), MediaType::Video.as_str()];
const PARTNER_TYPES: [&str; 3] = [
    PartnerType::Institutional.as_str(),
    PartnerType::Sponsor.as_str(),
    PartnerType::Media.as_str(),
];

const EVENT_FIELDS: &[FieldSpec] = &[
    field("title", "Event Title", FieldKind::Text),
    field("date", "Date (e.g. 25 DEC 2024)", FieldKind::Text),
    field("venue", "Venue", FieldKind::Text),
    field("description", "Description", FieldKind::LongText),
    field("imageUrl", "Image URL", FieldKind::Url),
    field("category", "Category", FieldKind::Select(&EVENT_CATEGORIES)),
    field("status", "Status", FieldKind::Select(&EVENT_STATUSES)),
];

const MEMBER_FIELDS: &[FieldSpec] = &[
    field("name", "Full Name", FieldKind::Text),
    field("role", "Role (e.g. President)", FieldKind::Text),
    field("photoUrl", "Photo URL", FieldKind::Url),
    field("year", "Committee Year", FieldKind::Number),
    optional("socials.facebook", "Facebook URL", FieldKind::Url),
    optional("socials.linkedin", "LinkedIn URL", FieldKind::Url),
    optional("socials.twitter", "Twitter URL", FieldKind::Url),
];

const ADVISOR_FIELDS: &[FieldSpec] = &[
    field("name", "Full Name", FieldKind::Text),
    field("designation", "Designation", FieldKind::Text),
    field("photoUrl", "Photo URL", FieldKind::Url),
];

const PUBLICATION_FIELDS: &[FieldSpec] = &[
    field("title", "Title", FieldKind::Text),
    field("author", "Author", FieldKind::Text),
    field(
        "category",
        "Category",
        FieldKind::Select(&PUBLICATION_CATEGORIES),
    ),
    field("imageUrl", "Image URL", FieldKind::Url),
    field("excerpt", "Excerpt", FieldKind::LongText),
    optional("isFeatured", "Featured", FieldKind::Checkbox),
];

const GALLERY_FIELDS: &[FieldSpec] = &[
    field("title", "Title", FieldKind::Text),
    field("event", "Event Name", FieldKind::Text),
    field("year", "Year", FieldKind::Number),
    field("type", "Media Type", FieldKind::Select(&MEDIA_TYPES)),
    field("url", "Media URL", FieldKind::Url),
];

const PARTNER_FIELDS: &[FieldSpec] = &[
    field("name", "Partner Name", FieldKind::Text),
    field("description", "Description", FieldKind::LongText),
    field("logoUrl", "Logo URL", FieldKind::Url),
    field("type", "Partner Type", FieldKind::Select(&PARTNER_TYPES)),
];

impl Section {
    pub const ALL: [Self; 7] = [
        Self::Events,
        Self::Committee,
        Self::Advisors,
        Self::Publications,
        Self::Gallery,
        Self::Partners,
        Self::Messages,
    ];

    /// Value used in the live protocol.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Committee => "committee",
            Self::Advisors => "advisors",
            Self::Publications => "publications",
            Self::Gallery => "gallery",
            Self::Partners => "partners",
            Self::Messages => "messages",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Events => "Events",
            Self::Committee => "Committee",
            Self::Advisors => "Advisors",
            Self::Publications => "Publications",
            Self::Gallery => "Gallery",
            Self::Partners => "Partners",
            Self::Messages => "Messages",
        }
    }

    /// Name of one record, for headings and notices.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Events => "event",
            Self::Committee => "member",
            Self::Advisors => "advisor",
            Self::Publications => "publication",
            Self::Gallery => "gallery item",
            Self::Partners => "partner",
            Self::Messages => "message",
        }
    }

    #[must_use]
    pub const fn collection(self) -> Collection {
        match self {
            Self::Events => Event::COLLECTION,
            Self::Committee => Member::COLLECTION,
            Self::Advisors => Advisor::COLLECTION,
            Self::Publications => Publication::COLLECTION,
            Self::Gallery => GalleryItem::COLLECTION,
            Self::Partners => Partner::COLLECTION,
            Self::Messages => ContactMessage::COLLECTION,
        }
    }

    /// Contact messages are listed but never edited.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Messages)
    }

    #[must_use]
    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Events => EVENT_FIELDS,
            Self::Committee => MEMBER_FIELDS,
            Self::Advisors => ADVISOR_FIELDS,
            Self::Publications => PUBLICATION_FIELDS,
            Self::Gallery => GALLERY_FIELDS,
            Self::Partners => PARTNER_FIELDS,
            Self::Messages => &[],
        }
    }

    #[must_use]
    pub const fn columns(self) -> &'static [Column] {
        match self {
            Self::Events => {
                const {
                    &[
                        column("Title", "title"),
                        column("Date", "date"),
                        column("Category", "category"),
                        column("Status", "status"),
                    ]
                }
            }
            Self::Committee => {
                const {
                    &[
                        column("Name", "name"),
                        column("Role", "role"),
                        column("Year", "year"),
                    ]
                }
            }
            Self::Advisors => {
                const { &[column("Name", "name"), column("Designation", "designation")] }
            }
            Self::Publications => {
                const {
                    &[
                        column("Title", "title"),
                        column("Author", "author"),
                        column("Category", "category"),
                        column("Featured", "isFeatured"),
                    ]
                }
            }
            Self::Gallery => {
                const {
                    &[
                        column("Title", "title"),
                        column("Event", "event"),
                        column("Year", "year"),
                        column("Type", "type"),
                    ]
                }
            }
            Self::Partners => const { &[column("Name", "name"), column("Type", "type")] },
            Self::Messages => {
                const {
                    &[
                        column("Name", "name"),
                        column("Email", "email"),
                        column("Received", "timestamp"),
                        column("Message", "message"),
                    ]
                }
            }
        }
    }

    /// Field values of an empty form.
    #[must_use]
    pub fn blank_form(self) -> BTreeMap<String, String> {
        let defaults = match self {
            Self::Events => store::encode(&Event::default()),
            Self::Committee => store::encode(&Member {
                year: Some(current_year()),
                ..Member::default()
            }),
            Self::Advisors => store::encode(&Advisor::default()),
            Self::Publications => store::encode(&Publication::default()),
            Self::Gallery => store::encode(&GalleryItem {
                year: current_year(),
                ..GalleryItem::default()
            }),
            Self::Partners => store::encode(&Partner::default()),
            Self::Messages => Ok(Fields::new()),
        };
        defaults.map_or_else(|_| BTreeMap::new(), |fields| self.to_form(&fields))
    }

    /// Prefill form values from stored fields.
    #[must_use]
    pub fn to_form(self, fields: &Fields) -> BTreeMap<String, String> {
        self.fields()
            .iter()
            .map(|spec| {
                let value = match (spec.kind, lookup(fields, spec.name)) {
                    (FieldKind::Checkbox, Some(Value::Bool(true))) => "on".to_string(),
                    (FieldKind::Checkbox, _) => String::new(),
                    (_, Some(value)) => display(value),
                    (_, None) => String::new(),
                };
                (spec.name.to_string(), value)
            })
            .collect()
    }

    /// Convert submitted form values into stored fields.
    ///
    /// Values are checked against the declarations, then run through the
    /// record type so only well-formed records reach the store.
    ///
    /// # Errors
    ///
    /// Returns a message for the form when a required value is missing or a
    /// value does not fit its field.
    pub fn from_form(self, values: &BTreeMap<String, String>) -> Result<Fields, String> {
        let mut root = Map::new();

        for spec in self.fields() {
            let raw = values.get(spec.name).map_or("", |value| value.trim());
            let value = match spec.kind {
                FieldKind::Checkbox => Value::Bool(matches!(raw, "on" | "true" | "1")),
                _ if raw.is_empty() => {
                    if spec.required {
                        return Err(format!("{} is required.", spec.label));
                    }
                    continue;
                }
                FieldKind::Number => raw
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| format!("{} must be a whole number.", spec.label))?,
                FieldKind::Select(options) => {
                    if !options.contains(&raw) {
                        return Err(format!("Choose a valid {}.", spec.label.to_lowercase()));
                    }
                    Value::String(raw.to_string())
                }
                FieldKind::Text | FieldKind::LongText | FieldKind::Url => {
                    Value::String(raw.to_string())
                }
            };
            insert_path(&mut root, spec.name, value);
        }

        match self {
            Self::Events => normalize::<Event>(root),
            Self::Committee => normalize::<Member>(root),
            Self::Advisors => normalize::<Advisor>(root),
            Self::Publications => normalize::<Publication>(root),
            Self::Gallery => normalize::<GalleryItem>(root),
            Self::Partners => normalize::<Partner>(root),
            Self::Messages => Err("Messages cannot be edited.".to_string()),
        }
    }
}

fn normalize<T: Record>(fields: Fields) -> Result<Fields, String> {
    let record: T = serde_json::from_value(Value::Object(fields))
        .map_err(|e| format!("Invalid {}: {e}", T::COLLECTION))?;
    store::encode(&record).map_err(|e| e.to_string())
}

fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}

/// Value at a dotted path.
#[must_use]
pub fn lookup<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = fields.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| value.get(segment))
}

/// Text shown for a stored value.
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        other => other.to_string(),
    }
}

fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            root.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_member_form_builds_nested_socials() {
        let fields = Section::Committee
            .from_form(&form(&[
                ("name", "Rafi"),
                ("role", "President"),
                ("photoUrl", "https://p/rafi.jpg"),
                ("year", "2024"),
                ("socials.linkedin", "https://lnkd/rafi"),
                ("socials.facebook", "  "),
            ]))
            .unwrap();

        assert_eq!(fields["year"], json!(2024));
        assert_eq!(
            fields["socials"],
            json!({ "linkedin": "https://lnkd/rafi" })
        );
    }

    #[test]
    fn test_required_and_number_errors() {
        let err = Section::Advisors
            .from_form(&form(&[("name", "Dr. Karim"), ("photoUrl", "https://p")]))
            .unwrap_err();
        assert_eq!(err, "Designation is required.");

        let err = Section::Gallery
            .from_form(&form(&[
                ("title", "Fest"),
                ("event", "Spring Fest"),
                ("year", "twenty"),
                ("type", "photo"),
                ("url", "https://g"),
            ]))
            .unwrap_err();
        assert_eq!(err, "Year must be a whole number.");
    }

    #[test]
    fn test_select_must_be_an_option() {
        let err = Section::Partners
            .from_form(&form(&[
                ("name", "Daily Star"),
                ("description", "Newspaper"),
                ("logoUrl", "https://l"),
                ("type", "friend"),
            ]))
            .unwrap_err();
        assert!(err.starts_with("Choose a valid"));
    }

    #[test]
    fn test_checkbox_defaults_to_false() {
        let fields = Section::Publications
            .from_form(&form(&[
                ("title", "Monsoon"),
                ("author", "Nila"),
                ("category", "Literature"),
                ("imageUrl", "https://i"),
                ("excerpt", "Rain..."),
            ]))
            .unwrap();
        assert_eq!(fields["isFeatured"], json!(false));
    }

    #[test]
    fn test_prefill_round_trips_through_form() {
        let stored = store::encode(&Event {
            title: "Spring Fest".into(),
            date: "14 APR 2025".into(),
            venue: "TSC".into(),
            description: "Pohela Boishakh".into(),
            image_url: "https://i".into(),
            category: EventCategory::Festival,
            status: EventStatus::Past,
        })
        .unwrap();

        let values = Section::Events.to_form(&stored);
        assert_eq!(values["category"], "Festival");
        assert_eq!(values["status"], "past");
        assert_eq!(Section::Events.from_form(&values).unwrap(), stored);
    }

    #[test]
    fn test_blank_committee_form_uses_current_year() {
        let values = Section::Committee.blank_form();
        assert_eq!(values["year"], current_year().to_string());
        assert_eq!(values["name"], "");
    }

    #[test]
    fn test_messages_are_read_only() {
        assert!(Section::Messages.is_read_only());
        assert!(Section::Messages.fields().is_empty());
        assert!(Section::Messages.from_form(&BTreeMap::new()).is_err());
    }

    #[test]
    fn test_lookup_dotted_path() {
        let fields = store::encode(&Member {
            socials: club_core::Socials {
                twitter: Some("https://x/rafi".into()),
                ..club_core::Socials::default()
            },
            ..Member::default()
        })
        .unwrap();
        assert_eq!(
            lookup(&fields, "socials.twitter"),
            Some(&json!("https://x/rafi"))
        );
        assert_eq!(lookup(&fields, "socials.linkedin"), None);
    }
}
