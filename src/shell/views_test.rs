use super::*;
use crate::nav::menu::build_navigation;
use crate::net::types::Role;
use crate::testing;

#[test]
fn header_tracks_session_phase() {
    assert_eq!(header(&AuthState::default(), PendingCounts::default()), "Clinic CRM | checking session...");
    assert_eq!(header(&AuthState::signed_out(), PendingCounts::default()), "Clinic CRM | signed out");

    let counts = PendingCounts { incomplete_patients: 2, upcoming_events: 1 };
    assert_eq!(header(&AuthState::signed_in(testing::ana()), counts), "Clinic CRM | Ana (admin) | 3 pending");
}

#[test]
fn header_shows_collaborator_city_and_hides_zero_badge() {
    let line = header(&AuthState::signed_in(testing::bia()), PendingCounts::default());
    assert_eq!(line, "Clinic CRM | Bia (collaborator) | Campinas/SP");
}

#[test]
fn sidebar_marks_badged_entries() {
    let text = sidebar(&build_navigation(Some(Role::Admin), 3, 0));
    let pending = text.lines().find(|l| l.contains("Pending registrations")).unwrap();
    assert!(pending.ends_with("[3]"));
    let events = text.lines().find(|l| l.trim_start().starts_with("Events")).unwrap();
    assert!(!events.contains('['));
    assert!(text.starts_with("Main\n"));
}

#[test]
fn whoami_variants() {
    assert_eq!(whoami(&AuthState::default()), "session not checked yet");
    assert_eq!(whoami(&AuthState::failed("Invalid credentials")), "not signed in (Invalid credentials)");
    assert_eq!(whoami(&AuthState::signed_in(testing::ana())), "Ana <ana> role=admin id=1");
}

#[test]
fn login_page_shows_error() {
    assert!(login_page(Some("Invalid credentials")).ends_with("error: Invalid credentials"));
    assert_eq!(page(None, "/nope"), "== Not found (/nope) ==");
}
