//! Route guard shared by every protected view.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected views apply identical unauthenticated redirect behavior: wait
//! while the session is loading, redirect to the login path when it settles
//! without a user, render content otherwise.
//!
//! DESIGN
//! ======
//! The guard remembers its last decision and only navigates on the
//! transition *into* `Denied`, so repeated notifications carrying the same
//! signed-out state never stack redirects.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::state::auth::AuthState;
use crate::state::scope::Scope;
use crate::state::session::SessionStore;
use crate::state::subscription::Subscription;

/// Guard decision for one `AuthState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Denied,
    Granted,
}

#[must_use]
pub fn evaluate(state: &AuthState) -> GuardState {
    if state.is_loading {
        GuardState::Pending
    } else if state.user.is_some() {
        GuardState::Granted
    } else {
        GuardState::Denied
    }
}

/// Client-side navigation target of guard redirects.
pub trait Navigator {
    fn navigate(&self, path: &str);
}

/// What a protected view should show.
#[derive(Debug, PartialEq, Eq)]
pub enum Rendered<T> {
    /// Session still loading.
    Placeholder,
    /// Denied; a redirect has been issued.
    Nothing,
    Content(T),
}

/// Redirect state machine, independent of how state changes are delivered.
pub struct RouteGuard {
    navigator: Rc<dyn Navigator>,
    login_path: String,
    current: Cell<Option<GuardState>>,
}

impl RouteGuard {
    pub fn new(navigator: Rc<dyn Navigator>, login_path: impl Into<String>) -> Self {
        Self { navigator, login_path: login_path.into(), current: Cell::new(None) }
    }

    /// Feed the latest state; redirects when this enters `Denied`.
    pub fn observe(&self, state: &AuthState) -> GuardState {
        let next = evaluate(state);
        let previous = self.current.replace(Some(next));
        if next == GuardState::Denied && previous != Some(GuardState::Denied) {
            tracing::debug!(to = %self.login_path, "guard redirect");
            self.navigator.navigate(&self.login_path);
        }
        next
    }

    #[must_use]
    pub fn state(&self) -> Option<GuardState> {
        self.current.get()
    }
}

/// A mounted protected view. Dropping it unmounts the guard.
pub struct ProtectedRoute {
    guard: Rc<RouteGuard>,
    store: SessionStore,
    _subscription: Subscription,
}

impl ProtectedRoute {
    /// Mount under `scope`, evaluating the current state immediately.
    ///
    /// # Panics
    ///
    /// When no ancestor of `scope` provides a session store.
    pub fn mount(scope: &Scope, navigator: Rc<dyn Navigator>, login_path: &str) -> Self {
        let store = scope.expect_session();
        let guard = Rc::new(RouteGuard::new(navigator, login_path));
        guard.observe(&store.state());

        let observer = Rc::clone(&guard);
        let subscription = store.subscribe(move |state| {
            observer.observe(state);
        });
        Self { guard, store, _subscription: subscription }
    }

    #[must_use]
    pub fn guard_state(&self) -> GuardState {
        self.guard.state().unwrap_or(GuardState::Pending)
    }

    /// Render `content` only when access is granted.
    pub fn render<T>(&self, content: impl FnOnce(&AuthState) -> T) -> Rendered<T> {
        match self.guard_state() {
            GuardState::Pending => Rendered::Placeholder,
            GuardState::Denied => Rendered::Nothing,
            GuardState::Granted => Rendered::Content(content(&self.store.state())),
        }
    }
}
