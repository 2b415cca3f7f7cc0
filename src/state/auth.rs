//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Observed by route guards, the header and the navigation builder to
//! coordinate login redirects and identity-dependent rendering. Only
//! `SessionStore` writes it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::{Collaborator, Role, SessionPayload, User};
use crate::state::query_cache::QuerySnapshot;

/// Cache key of the "who am I" entry.
pub const SESSION_KEY: &str = "auth/me";

/// Authentication state tracking the current principal and probe status.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub collaborator: Option<Collaborator>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Process start: nothing known yet, probe pending.
impl Default for AuthState {
    fn default() -> Self {
        Self { user: None, collaborator: None, is_loading: true, error: None }
    }
}

impl AuthState {
    /// Confirmed unauthenticated: no user, not loading, no error.
    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None, collaborator: None, is_loading: false, error: None }
    }

    #[must_use]
    pub fn signed_in(payload: SessionPayload) -> Self {
        Self { user: Some(payload.user), collaborator: payload.collaborator, is_loading: false, error: None }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { user: None, collaborator: None, is_loading: false, error: Some(message.into()) }
    }

    #[must_use]
    pub fn is_confirmed_unauthenticated(&self) -> bool {
        self.user.is_none() && !self.is_loading && self.error.is_none()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

/// Decode the cached session value. `null` means "no session".
fn decode_session(data: &serde_json::Value) -> Result<Option<SessionPayload>, String> {
    serde_json::from_value::<Option<SessionPayload>>(data.clone())
        .map_err(|e| format!("malformed session payload: {e}"))
}

/// Merge a snapshot of the session cache entry into the previous state.
///
/// | loading | has user | error   | result                                   |
/// |---------|----------|---------|------------------------------------------|
/// | yes     | -        | -       | previous user/collaborator, loading      |
/// | no      | yes      | -       | cached user/collaborator, no error       |
/// | no      | no       | present | signed out with the error message        |
/// | no      | no       | absent  | signed out                               |
#[must_use]
pub fn reconcile(previous: &AuthState, snapshot: &QuerySnapshot) -> AuthState {
    if snapshot.loading {
        return AuthState { is_loading: true, ..previous.clone() };
    }

    let decoded = snapshot.data.as_ref().map(decode_session).transpose();
    match decoded {
        Ok(Some(Some(payload))) => AuthState::signed_in(payload),
        Ok(_) => match &snapshot.error {
            Some(message) => AuthState::failed(message.clone()),
            None => AuthState::signed_out(),
        },
        Err(decode_error) => AuthState::failed(snapshot.error.clone().unwrap_or(decode_error)),
    }
}
