//! Text renderings of the header, sidebar and pages.

#[cfg(test)]
#[path = "views_test.rs"]
mod views_test;

use crate::nav::counts::PendingCounts;
use crate::nav::menu::NavGroup;
use crate::state::auth::AuthState;

pub const APP_TITLE: &str = "Clinic CRM";

/// One-line header: identity, role and the pending badge.
#[must_use]
pub fn header(state: &AuthState, counts: PendingCounts) -> String {
    if state.is_loading {
        return format!("{APP_TITLE} | checking session...");
    }
    let Some(user) = &state.user else {
        return format!("{APP_TITLE} | signed out");
    };
    let mut parts = vec![APP_TITLE.to_owned(), format!("{} ({})", user.name, user.role)];
    if let Some(collaborator) = &state.collaborator {
        parts.push(format!("{}/{}", collaborator.city.name, collaborator.city.state));
    }
    match counts.notification_count() {
        0 => {}
        n => parts.push(format!("{n} pending")),
    }
    parts.join(" | ")
}

#[must_use]
pub fn sidebar(groups: &[NavGroup]) -> String {
    let mut lines = Vec::new();
    for group in groups {
        lines.push(group.title.to_owned());
        for entry in &group.entries {
            lines.push(match entry.badge {
                Some(n) => format!("  {:<24} {:<28} [{n}]", entry.label, entry.path),
                None => format!("  {:<24} {}", entry.label, entry.path),
            });
        }
    }
    lines.join("\n")
}

#[must_use]
pub fn login_page(error: Option<&str>) -> String {
    match error {
        Some(error) => format!("Sign in: login <username> <password>\n  error: {error}"),
        None => "Sign in: login <username> <password>".to_owned(),
    }
}

#[must_use]
pub fn page(label: Option<&str>, path: &str) -> String {
    match label {
        Some(label) => format!("== {label} ({path}) =="),
        None => format!("== Not found ({path}) =="),
    }
}

#[must_use]
pub fn whoami(state: &AuthState) -> String {
    match (&state.user, &state.error) {
        (Some(user), _) => format!("{} <{}> role={} id={}", user.name, user.username, user.role, user.id),
        (None, Some(error)) => format!("not signed in ({error})"),
        (None, None) if state.is_loading => "session not checked yet".to_owned(),
        (None, None) => "not signed in".to_owned(),
    }
}
