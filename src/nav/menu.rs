//! Fixed per-role menus and the builder that decorates them.
//!
//! The role selects a whole menu; there are no per-entry capability checks.
//! Entries defined with a badge source carry the live count, and a zero
//! count carries no badge at all.

#[cfg(test)]
#[path = "menu_test.rs"]
mod menu_test;

use crate::net::types::Role;

/// Which pending count decorates an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeSource {
    IncompletePatients,
    UpcomingEvents,
}

struct EntryDef {
    label: &'static str,
    path: &'static str,
    badge: Option<BadgeSource>,
}

struct GroupDef {
    title: &'static str,
    entries: &'static [EntryDef],
}

const fn entry(label: &'static str, path: &'static str) -> EntryDef {
    EntryDef { label, path, badge: None }
}

const fn badged(label: &'static str, path: &'static str, source: BadgeSource) -> EntryDef {
    EntryDef { label, path, badge: Some(source) }
}

const ADMIN_MENU: &[GroupDef] = &[
    GroupDef {
        title: "Main",
        entries: &[
            entry("Dashboard", "/"),
            entry("Patients", "/patients"),
            badged("Pending registrations", "/patients/pending", BadgeSource::IncompletePatients),
            entry("Procedures", "/procedures"),
            badged("Events", "/events", BadgeSource::UpcomingEvents),
        ],
    },
    GroupDef {
        title: "Management",
        entries: &[
            entry("Collaborators", "/collaborators"),
            entry("Performance", "/collaborators/performance"),
            entry("Cities", "/cities"),
        ],
    },
    GroupDef { title: "Account", entries: &[entry("Settings", "/settings")] },
];

const COLLABORATOR_MENU: &[GroupDef] = &[
    GroupDef {
        title: "Main",
        entries: &[
            entry("Dashboard", "/"),
            entry("My patients", "/patients"),
            badged("Pending registrations", "/patients/pending", BadgeSource::IncompletePatients),
            entry("Procedures", "/procedures"),
            badged("Events", "/events", BadgeSource::UpcomingEvents),
        ],
    },
    GroupDef {
        title: "Account",
        entries: &[entry("My performance", "/performance"), entry("Settings", "/settings")],
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub path: &'static str,
    /// Live pending count; `None` when the entry is unbadged or the count is 0.
    pub badge: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavGroup {
    pub title: &'static str,
    pub entries: Vec<NavEntry>,
}

fn menu_for(role: Role) -> &'static [GroupDef] {
    match role {
        Role::Admin => ADMIN_MENU,
        Role::Collaborator => COLLABORATOR_MENU,
    }
}

/// Navigation groups for `role`. Empty when no role is known.
#[must_use]
pub fn build_navigation(role: Option<Role>, incomplete_patients: usize, upcoming_events: usize) -> Vec<NavGroup> {
    let Some(role) = role else {
        return Vec::new();
    };
    let count = |source: BadgeSource| match source {
        BadgeSource::IncompletePatients => incomplete_patients,
        BadgeSource::UpcomingEvents => upcoming_events,
    };

    menu_for(role)
        .iter()
        .map(|group| NavGroup {
            title: group.title,
            entries: group
                .entries
                .iter()
                .map(|def| NavEntry {
                    label: def.label,
                    path: def.path,
                    badge: def.badge.map(count).filter(|n| *n > 0),
                })
                .collect(),
        })
        .collect()
}

/// Label of the menu entry at `path` for `role`, if the role's menu has one.
#[must_use]
pub fn find_entry(role: Role, path: &str) -> Option<&'static str> {
    menu_for(role).iter().flat_map(|g| g.entries.iter()).find(|e| e.path == path).map(|e| e.label)
}
