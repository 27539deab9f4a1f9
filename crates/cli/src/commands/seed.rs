//! Seed content collections from a YAML file.
//!
//! The file maps collection names to lists of records:
//!
//! ```yaml
//! events:
//!   - title: Spring Fest
//!     date: 14 APR 2025
//!     venue: Main Auditorium
//!     description: Songs and stories for the new year.
//!     imageUrl: https://images.example.org/spring.jpg
//!     category: Festival
//!     status: upcoming
//! committees:
//!   - name: Meera Iyer
//!     role: President
//!     photoUrl: https://images.example.org/meera.jpg
//!     year: 2025
//! ```
//!
//! Every record is decoded as its collection's record type before anything is
//! written, so a file with one bad entry writes nothing.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{error, info};

use club_core::{
    Advisor, Collection, ContactMessage, Event, GalleryItem, Member, Partner, Publication, Record,
};
use club_site::store::{self, ContentStore, Fields};

use super::CliError;

/// Seed the store from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any record is
/// invalid, or a write fails.
pub async fn from_file(path: &Path, dry_run: bool) -> Result<(), CliError> {
    info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let documents = parse(&content)?;

    info!(records = documents.len(), "Seed file validated");
    if dry_run {
        return Ok(());
    }

    let store = super::connect().await?;
    for (collection, fields) in documents {
        let id = store.create(collection, fields).await?;
        info!(%collection, %id, "Created document");
    }

    info!("Seeding complete");
    Ok(())
}

/// Parse and validate a seed file into documents ready for the store.
///
/// # Errors
///
/// Returns [`CliError::Yaml`] for malformed YAML and
/// [`CliError::InvalidRecords`] when records do not match their collection.
pub fn parse(content: &str) -> Result<Vec<(Collection, Fields)>, CliError> {
    let file: BTreeMap<Collection, Vec<Value>> = serde_yaml::from_str(content)?;

    let mut documents = Vec::new();
    let mut invalid = 0;
    for (collection, records) in file {
        for (index, record) in records.into_iter().enumerate() {
            match normalize(collection, record) {
                Ok(fields) => documents.push((collection, fields)),
                Err(message) => {
                    error!(%collection, index, "{message}");
                    invalid += 1;
                }
            }
        }
    }

    if invalid > 0 {
        return Err(CliError::InvalidRecords(invalid));
    }
    Ok(documents)
}

fn normalize(collection: Collection, record: Value) -> Result<Fields, String> {
    match collection {
        Collection::Events => through::<Event>(record),
        Collection::Committees => through::<Member>(record),
        Collection::Advisors => through::<Advisor>(record),
        Collection::Publications => through::<Publication>(record),
        Collection::GalleryItems => through::<GalleryItem>(record),
        Collection::Partners => through::<Partner>(record),
        Collection::Messages => through::<ContactMessage>(record),
        Collection::Admins => Err("admins are managed with `club-cli admin grant`".to_string()),
    }
}

// Round-trip through the record type so stored fields match what the site decodes.
fn through<T: Record>(record: Value) -> Result<Fields, String> {
    let record: T = serde_json::from_value(record).map_err(|e| e.to_string())?;
    store::encode(&record).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const EVENT: &str = "events:
  - title: Spring Fest
    date: 14 APR 2025
    venue: Main Auditorium
    description: Songs and stories.
    imageUrl: https://images.example.org/spring.jpg
    category: Festival
    status: upcoming
";

    #[test]
    fn test_parse_normalizes_records() {
        let content = format!(
            "{EVENT}committees:\n  - name: Meera Iyer\n    role: President\n    photoUrl: https://images.example.org/meera.jpg\n    year: 2025\n"
        );
        let documents = parse(&content).unwrap();

        assert_eq!(documents.len(), 2);
        let (collection, event) = &documents[0];
        assert_eq!(*collection, Collection::Events);
        assert_eq!(event["title"], "Spring Fest");
        assert_eq!(event["status"], "upcoming");

        let (collection, member) = &documents[1];
        assert_eq!(*collection, Collection::Committees);
        assert_eq!(member["year"], 2025);
        assert!(member["socials"].is_object());
    }

    #[test]
    fn test_invalid_records_reject_whole_file() {
        let content = format!("{EVENT}  - title: Broken\n    category: Karaoke\npartners:\n  - name: 7\n");
        let err = parse(&content).unwrap_err();
        assert!(matches!(err, CliError::InvalidRecords(2)));
    }

    #[test]
    fn test_admins_cannot_be_seeded() {
        let err = parse("admins:\n  - uid: abc\n").unwrap_err();
        assert!(matches!(err, CliError::InvalidRecords(1)));
    }

    #[test]
    fn test_unknown_collection() {
        assert!(matches!(
            parse("recipes:\n  - title: Soup\n").unwrap_err(),
            CliError::Yaml(_)
        ));
    }
}
