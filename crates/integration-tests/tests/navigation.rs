//! Routing and gating through a live session.
//!
//! Each test opens a simulated tab and checks the address bar and the
//! rendered page the way a visitor would see them.

use std::time::Duration;

use club_core::Route;
use club_integration_tests::{TestSite, marker};

// =============================================================================
// Initial load
// =============================================================================

#[tokio::test]
async fn test_first_render_is_loading_placeholder() {
    let site = TestSite::new();
    let mut tab = site.open("#events").await;

    tab.wait_until("first render", |b| b.renders() > 0).await;
    assert!(tab.main().contains(marker::LOADING));
    assert!(!tab.main().contains(marker::LOGIN_FORM));
}

#[tokio::test]
async fn test_fresh_load_of_admin_renders_login() {
    let site = TestSite::new();
    let mut tab = site.open("#admin").await;

    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.settle().await;

    assert_eq!(tab.hash(), "#admin", "gated fragment is not rewritten");
    assert!(tab.fragment_writes().is_empty());
    assert!(tab.header().contains("Portal Login"));
    assert_eq!(tab.credential(), None);
}

#[tokio::test]
async fn test_bogus_fragment_is_rewritten_to_home() {
    let site = TestSite::new();
    let mut tab = site.open("#bogus").await;

    tab.wait_for_text(marker::HOME_HERO).await;
    tab.settle().await;

    assert_eq!(tab.hash(), "#home");
    assert_eq!(tab.fragment_writes(), ["#home".to_string()]);
}

#[tokio::test]
async fn test_empty_fragment_lands_on_home() {
    let site = TestSite::new();
    let mut tab = site.open("").await;

    tab.wait_for_text(marker::HOME_HERO).await;
    assert_eq!(tab.hash(), "#home");
}

#[tokio::test]
async fn test_fragment_is_case_insensitive() {
    let site = TestSite::new();
    let mut tab = site.open("#CONTACT").await;

    tab.wait_for_text("<h1>Contact Us</h1>").await;
    tab.settle().await;
    assert_eq!(tab.fragment_writes(), ["#contact".to_string()]);
    assert_eq!(tab.hash(), "#contact");
}

#[tokio::test]
async fn test_links_navigate_through_the_session() {
    let site = TestSite::new();
    let mut tab = site.open("#home").await;
    tab.wait_for_text(marker::HOME_HERO).await;

    tab.click_link("events").await;
    tab.wait_for_text("<h1>Events</h1>").await;
    assert_eq!(tab.hash(), "#events");

    tab.click_link("join").await;
    tab.wait_for_text("<h1>Join the Club</h1>").await;
    tab.click_link("register").await;
    tab.wait_for_text(marker::REGISTER_FORM).await;

    assert_eq!(
        tab.fragment_writes(),
        ["#events".to_string(), "#join".to_string(), "#register".to_string()]
    );
    assert_eq!(tab.scrolls(), 3);
}

#[tokio::test]
async fn test_typed_fragment_is_canonicalized() {
    let site = TestSite::new();
    let mut tab = site.open("#home").await;
    tab.wait_for_text(marker::HOME_HERO).await;

    tab.visit("#Events").await;
    tab.wait_for_text("<h1>Events</h1>").await;
    tab.settle().await;

    assert_eq!(tab.hash(), "#events");
    assert_eq!(tab.fragment_writes(), ["#events".to_string()]);
    assert_eq!(tab.scrolls(), 1);
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_navigate_writes_fragment_and_scrolls() {
    let site = TestSite::new();
    let mut tab = site.open("#home").await;
    tab.wait_for_text(marker::HOME_HERO).await;

    tab.navigate(Route::Join).await;
    tab.wait_for_text("<h1>Join the Club</h1>").await;

    assert_eq!(tab.hash(), "#join");
    assert_eq!(tab.scrolls(), 1);
    assert!(tab.header().contains("href=\"#join\""));
}

#[tokio::test]
async fn test_navigate_to_current_route_changes_nothing() {
    let site = TestSite::new();
    let mut tab = site.open("#about").await;
    tab.wait_for_text("<h1>About Us</h1>").await;
    tab.settle().await;
    let renders = tab.renders();

    tab.navigate(Route::About).await;
    tab.settle().await;

    assert_eq!(tab.hash(), "#about");
    assert_eq!(tab.fragment_writes(), ["#about".to_string()]);
    assert_eq!(tab.scrolls(), 0, "no hashchange means no scroll");
    assert_eq!(tab.renders(), renders);
}

#[tokio::test]
async fn test_visiting_unknown_fragment_later_falls_back() {
    let site = TestSite::new();
    let mut tab = site.open("#events").await;
    tab.wait_for_text("<h1>Events</h1>").await;

    tab.visit("#nowhere").await;
    tab.wait_for_text(marker::HOME_HERO).await;
    assert_eq!(tab.hash(), "#home");
}

// =============================================================================
// Gating
// =============================================================================

#[tokio::test]
async fn test_member_is_kept_out_of_admin() {
    let site = TestSite::new();
    site.member("member@club.org", "secret-pass").await;

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("member@club.org", "secret-pass").await;

    tab.wait_for_text(marker::PORTAL).await;
    assert_eq!(tab.hash(), "#portal");
    assert!(tab.main().contains("member@club.org"));
    assert!(tab.header().contains(">Portal<"));

    tab.visit("#admin").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.settle().await;

    assert_eq!(tab.hash(), "#admin");
    assert!(tab.header().contains(marker::SIGN_OUT), "still signed in");
}

#[tokio::test]
async fn test_admin_sign_in_lands_on_admin_panel() {
    let site = TestSite::new();
    site.admin("chair@club.org", "secret-pass").await;

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("chair@club.org", "secret-pass").await;

    tab.wait_for_text(marker::ADMIN).await;
    assert_eq!(tab.hash(), "#admin");
    assert!(tab.main().contains("Signed in as chair@club.org"));
    assert!(tab.header().contains("Admin Panel"));
}

#[tokio::test]
async fn test_admin_sign_in_stays_pending_until_admin_page() {
    let site = TestSite::new();
    site.admin("chair@club.org", "secret-pass").await;
    site.directory
        .set_privilege_latency(Duration::from_millis(300))
        .await;

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("chair@club.org", "secret-pass").await;

    tab.wait_for_text(marker::ADMIN).await;
    tab.settle().await;
    assert_eq!(tab.hash(), "#admin");

    // While gating for #admin is pending, the form keeps its in-flight state.
    let on_admin: Vec<_> = tab
        .pages_seen()
        .iter()
        .filter(|(hash, _)| hash == "#admin")
        .collect();
    assert!(!on_admin.is_empty());
    for (_, main) in on_admin {
        assert!(
            main.contains(marker::ADMIN) || main.contains("Signing in&hellip;"),
            "idle login form rendered on #admin: {main}"
        );
    }

    // The form is released once the admin panel is in place.
    tab.visit("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.settle().await;
    assert!(!tab.main().contains("Signing in&hellip;"));
}

#[tokio::test]
async fn test_portal_without_session_renders_login_in_place() {
    let site = TestSite::new();
    let mut tab = site.open("#portal").await;

    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.settle().await;
    assert_eq!(tab.hash(), "#portal");
}

#[tokio::test]
async fn test_failed_privilege_lookup_fails_closed() {
    let site = TestSite::new();
    site.admin("chair@club.org", "secret-pass").await;
    site.directory.fail_privilege_lookups(true);

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("chair@club.org", "secret-pass").await;

    tab.wait_for_text(marker::PORTAL).await;
    tab.visit("#admin").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
}

#[tokio::test]
async fn test_no_privilege_lookup_without_session() {
    let site = TestSite::new();
    let mut tab = site.open("#home").await;
    tab.wait_for_text(marker::HOME_HERO).await;
    tab.visit("#admin").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.settle().await;

    assert_eq!(site.directory.privilege_lookups(), 0);
}

#[tokio::test]
async fn test_stale_privilege_is_not_granted_to_next_user() {
    let site = TestSite::new();
    site.admin("chair@club.org", "secret-pass").await;
    site.directory
        .set_privilege_latency(Duration::from_millis(300))
        .await;

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;

    // The admin's lookups are still in flight when they sign out and a new
    // member signs up in the same tab.
    tab.sign_in("chair@club.org", "secret-pass").await;
    tab.wait_until("admin session", |b| b.header().contains("chair@club.org"))
        .await;
    tab.sign_out().await;
    tab.wait_until("signed out", |b| b.header().contains("Portal Login"))
        .await;
    tab.sign_up("new@club.org", "another-pass", "another-pass").await;
    tab.wait_until("member portal", |b| {
        b.hash() == "#portal" && b.main().contains(marker::PORTAL)
    })
    .await;
    tab.settle().await;

    for header in tab.headers_seen() {
        if header.contains("new@club.org") {
            assert!(
                !header.contains("Admin Panel"),
                "member was shown admin access: {header}"
            );
        }
    }

    tab.visit("#admin").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
}

// =============================================================================
// Sign out
// =============================================================================

#[tokio::test]
async fn test_sign_out_returns_home_and_forgets_credential() {
    let site = TestSite::new();
    site.member("member@club.org", "secret-pass").await;

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("member@club.org", "secret-pass").await;
    tab.wait_for_text(marker::PORTAL).await;
    assert!(tab.credential().is_some());

    tab.sign_out().await;
    tab.wait_until("home after sign out", |b| {
        b.hash() == "#home" && b.main().contains(marker::HOME_HERO)
    })
    .await;
    tab.settle().await;

    assert!(tab.header().contains("Portal Login"));
    assert_eq!(tab.credential(), None);
}

#[tokio::test]
async fn test_failed_sign_out_still_navigates_home() {
    let site = TestSite::new();
    site.member("member@club.org", "secret-pass").await;
    site.directory.fail_sign_outs(true);

    let mut tab = site.open("#login").await;
    tab.wait_for_text(marker::LOGIN_FORM).await;
    tab.sign_in("member@club.org", "secret-pass").await;
    tab.wait_for_text(marker::PORTAL).await;

    tab.sign_out().await;
    tab.wait_until("home after failed sign out", |b| {
        b.hash() == "#home" && b.main().contains(marker::HOME_HERO)
    })
    .await;

    // The session is still authoritative.
    assert!(tab.header().contains(marker::SIGN_OUT));
}
