//! Public pages rendered from store content.

#![allow(clippy::unwrap_used)]

use club_core::{Collection, Event, EventStatus, Member, Partner, PartnerType, Publication};
use club_integration_tests::TestSite;
use club_site::store::{ContentStore, Records};
use serde_json::json;

async fn seed_event(site: &TestSite, title: &str, status: EventStatus) {
    site.store
        .insert(&Event {
            title: title.to_string(),
            status,
            ..Event::default()
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_events_page_splits_upcoming_and_past() {
    let site = TestSite::new();
    seed_event(&site, "Open Mic", EventStatus::Upcoming).await;
    seed_event(&site, "Winter Gala", EventStatus::Past).await;

    let mut tab = site.open("#events").await;
    tab.wait_for_text("Winter Gala").await;

    let main = tab.main();
    let upcoming = main.find("Open Mic").unwrap();
    let past_heading = main.find("<h2>Past Events</h2>").unwrap();
    let past = main.find("Winter Gala").unwrap();
    assert!(upcoming < past_heading && past_heading < past);
}

#[tokio::test]
async fn test_home_shows_latest_leadership() {
    let site = TestSite::new();
    for (name, role, year) in [
        ("Old President", "President", 2023),
        ("Meera Iyer", "President", 2024),
        ("Kabir Rao", "Member", 2024),
    ] {
        site.store
            .insert(&Member {
                name: name.to_string(),
                role: role.to_string(),
                year: Some(year),
                ..Member::default()
            })
            .await
            .unwrap();
    }
    seed_event(&site, "Open Mic", EventStatus::Upcoming).await;

    let mut tab = site.open("#home").await;
    tab.wait_for_text("Meera Iyer").await;
    assert!(tab.main().contains("Open Mic"));
    assert!(!tab.main().contains("Old President"));
}

#[tokio::test]
async fn test_committee_groups_by_year_newest_first() {
    let site = TestSite::new();
    for (name, year) in [("Asha", 2023), ("Kabir", 2025)] {
        site.store
            .insert(&Member {
                name: name.to_string(),
                role: "Member".to_string(),
                year: Some(year),
                ..Member::default()
            })
            .await
            .unwrap();
    }

    let mut tab = site.open("#committee").await;
    tab.wait_for_text("Committee 2023").await;

    let main = tab.main();
    assert!(main.find("Committee 2025").unwrap() < main.find("Committee 2023").unwrap());
}

#[tokio::test]
async fn test_featured_publication_comes_first() {
    let site = TestSite::new();
    for (title, featured) in [("Ordinary Issue", false), ("Anniversary Issue", true)] {
        site.store
            .insert(&Publication {
                title: title.to_string(),
                is_featured: featured,
                ..Publication::default()
            })
            .await
            .unwrap();
    }

    let mut tab = site.open("#publications").await;
    tab.wait_for_text("Ordinary Issue").await;

    let main = tab.main();
    assert!(main.find("Anniversary Issue").unwrap() < main.find("Ordinary Issue").unwrap());
}

#[tokio::test]
async fn test_partners_grouped_by_type() {
    let site = TestSite::new();
    site.store
        .insert(&Partner {
            name: "City Radio".to_string(),
            partner_type: PartnerType::Media,
            ..Partner::default()
        })
        .await
        .unwrap();

    let mut tab = site.open("#partners").await;
    tab.wait_for_text("City Radio").await;
    assert!(tab.main().contains("Media Partners"));
    assert!(!tab.main().contains("Sponsors"));
}

#[tokio::test]
async fn test_malformed_documents_do_not_break_the_page() {
    let site = TestSite::new();
    site.store
        .create(
            Collection::Events,
            json!({ "title": 42, "status": "sometime" })
                .as_object()
                .cloned()
                .unwrap(),
        )
        .await
        .unwrap();
    seed_event(&site, "Open Mic", EventStatus::Upcoming).await;

    let mut tab = site.open("#events").await;
    tab.wait_for_text("Open Mic").await;
}

#[tokio::test]
async fn test_unavailable_store_shows_error_in_place() {
    let site = TestSite::new();
    site.store.set_unavailable(true);

    let mut tab = site.open("#gallery").await;
    tab.wait_for_text("Could not load content. Please try again later.")
        .await;
    assert!(tab.main().contains("<h1>Gallery</h1>"));
}
