//! Admin collection manager driven through the live protocol.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeMap;

use club_core::{ContactMessage, Email, Event, EventCategory, EventStatus};
use club_integration_tests::{FakeBrowser, TestSite, marker};
use club_site::admin::{AdminAction, Section};
use club_site::store::Records;

fn event_form(title: &str) -> BTreeMap<String, String> {
    [
        ("title", title),
        ("date", "14 APR 2025"),
        ("venue", "Main Auditorium"),
        ("description", "Songs and stories to welcome the new year."),
        ("imageUrl", "https://images.example.org/spring.jpg"),
        ("category", "Festival"),
        ("status", "upcoming"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

async fn admin_tab(site: &TestSite) -> FakeBrowser {
    site.admin("chair@club.org", "secret-pass").await;
    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("chair@club.org", "secret-pass").await;
    tab.wait_for_text(marker::ADMIN).await;
    tab
}

#[tokio::test]
async fn test_create_edit_delete_event() {
    let site = TestSite::new();
    let mut tab = admin_tab(&site).await;
    tab.wait_for_text("Nothing here yet.").await;

    // Create
    tab.admin(AdminAction::New {
        section: Section::Events,
    })
    .await;
    tab.wait_for_text("Add New event").await;
    tab.admin(AdminAction::Save {
        section: Section::Events,
        values: event_form("Spring Fest"),
    })
    .await;
    tab.wait_until("created row", |b| {
        b.main().contains("<td>Spring Fest</td>") && !b.main().contains("data-admin-form")
    })
    .await;

    let events = site.store.records::<Event>().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].record.category, EventCategory::Festival);
    assert_eq!(events[0].record.status, EventStatus::Upcoming);
    let id = events[0].id.clone();

    // Edit
    tab.admin(AdminAction::Edit {
        section: Section::Events,
        id: id.clone(),
    })
    .await;
    tab.wait_for_text("Edit event").await;
    assert!(tab.main().contains("value=\"Main Auditorium\""));
    tab.admin(AdminAction::Save {
        section: Section::Events,
        values: event_form("Monsoon Nights"),
    })
    .await;
    tab.wait_for_text("<td>Monsoon Nights</td>").await;

    let stored = site.store.record::<Event>(&id).await.unwrap().unwrap();
    assert_eq!(stored.record.title, "Monsoon Nights");

    // Delete
    tab.admin(AdminAction::Delete {
        section: Section::Events,
        id,
    })
    .await;
    tab.wait_for_text("Nothing here yet.").await;
    assert!(site.store.records::<Event>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_form_stays_open() {
    let site = TestSite::new();
    let mut tab = admin_tab(&site).await;

    tab.admin(AdminAction::New {
        section: Section::Events,
    })
    .await;
    tab.wait_for_text("Add New event").await;

    let mut values = event_form("   ");
    values.insert("venue".to_string(), "Open Air Theatre".to_string());
    tab.admin(AdminAction::Save {
        section: Section::Events,
        values,
    })
    .await;

    tab.wait_for_text("Event Title is required.").await;
    assert!(tab.main().contains("value=\"Open Air Theatre\""), "input is kept");
    assert!(site.store.records::<Event>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_failure_becomes_notice() {
    let site = TestSite::new();
    let mut tab = admin_tab(&site).await;
    tab.wait_for_text("Nothing here yet.").await;

    tab.admin(AdminAction::New {
        section: Section::Events,
    })
    .await;
    tab.wait_for_text("Add New event").await;
    site.store.set_unavailable(true);
    tab.admin(AdminAction::Save {
        section: Section::Events,
        values: event_form("Spring Fest"),
    })
    .await;

    tab.wait_for_text("Failed to save event.").await;
    assert_eq!(tab.hash(), "#admin");
    assert!(tab.main().contains(marker::ADMIN), "navigation is untouched");
}

#[tokio::test]
async fn test_messages_are_listed_read_only() {
    let site = TestSite::new();
    site.store
        .insert(&ContactMessage::now(
            "Ravi",
            Email::parse("ravi@example.org").unwrap(),
            "Can alumni join the choir?",
        ))
        .await
        .unwrap();

    let mut tab = admin_tab(&site).await;
    tab.admin(AdminAction::Open {
        section: Section::Messages,
    })
    .await;

    tab.wait_for_text("Can alumni join the choir?").await;
    assert!(tab.main().contains("ravi@example.org"));
    assert!(!tab.main().contains("data-admin=\"new\""));
    assert!(!tab.main().contains("data-admin=\"delete\""));
}

#[tokio::test]
async fn test_admin_actions_are_ignored_outside_admin_page() {
    let site = TestSite::new();
    let id = site
        .store
        .insert(&Event {
            title: "Poetry Slam".to_string(),
            ..Event::default()
        })
        .await
        .unwrap();
    site.member("member@club.org", "secret-pass").await;

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("member@club.org", "secret-pass").await;
    tab.wait_for_text(marker::PORTAL).await;

    tab.admin(AdminAction::Delete {
        section: Section::Events,
        id: id.clone(),
    })
    .await;
    tab.settle().await;

    assert!(site.store.record::<Event>(&id).await.unwrap().is_some());
    assert!(tab.main().contains(marker::PORTAL));
}

#[tokio::test]
async fn test_committee_form_nests_socials() {
    let site = TestSite::new();
    let mut tab = admin_tab(&site).await;

    tab.admin(AdminAction::Open {
        section: Section::Committee,
    })
    .await;
    tab.wait_for_text("Nothing here yet.").await;
    tab.admin(AdminAction::New {
        section: Section::Committee,
    })
    .await;
    tab.wait_for_text("Add New member").await;

    let values: BTreeMap<String, String> = [
        ("name", "Meera Iyer"),
        ("role", "President"),
        ("photoUrl", "https://images.example.org/meera.jpg"),
        ("year", "2025"),
        ("socials.linkedin", "https://linkedin.example.org/meera"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    tab.admin(AdminAction::Save {
        section: Section::Committee,
        values,
    })
    .await;
    tab.wait_for_text("<td>Meera Iyer</td>").await;

    let members = site.store.records::<club_core::Member>().await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].record.year, Some(2025));
    assert_eq!(
        members[0].record.socials.linkedin.as_deref(),
        Some("https://linkedin.example.org/meera")
    );
}
