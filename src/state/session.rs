//! Session store: the single owner of `AuthState`.
//!
//! ARCHITECTURE
//! ============
//! The store subscribes to the query cache's session entry and merges every
//! change through `auth::reconcile`. Its own login/logout results are
//! applied after the mutation settles and win over whatever a background
//! probe produced: they are written into the cache first (which advances
//! the entry generation and so discards any probe still in flight), then
//! published as the new state in a single transition.
//!
//! TRADE-OFFS
//! ==========
//! Mutations are not cancelled. With `MutationOrdering::LastSettled` a slow
//! earlier login can overwrite a later one; `LastIssued` drops results of
//! mutations issued before the last applied one.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::auth::{self, AuthState, SESSION_KEY};
use super::query_cache::{Fetcher, QueryError, QuerySnapshot, SessionCache};
use super::subscription::{ListenerSet, Subscription};
use crate::net::api::{ApiError, ClinicApi};
use crate::net::types::{LoginRequest, Role};
use crate::util::toast::{Notifier, Toast};

/// How results of overlapping login/logout calls are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MutationOrdering {
    /// Every settled result is applied; the last to settle wins.
    #[default]
    LastSettled,
    /// A result is dropped if a later-issued mutation was already applied.
    LastIssued,
}

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("{0}")]
    Login(ApiError),
    #[error("logout failed: {0}")]
    Logout(ApiError),
    #[error("a newer session change already took effect")]
    Superseded,
}

/// Callback invoked with the new state after every transition.
pub type StateListener = dyn Fn(&AuthState);

struct StoreState {
    auth: AuthState,
    last_ticket: u64,
    applied_ticket: u64,
    /// Identity the cached role-specific data belongs to.
    principal: Option<String>,
}

struct Shared {
    state: RefCell<StoreState>,
    listeners: ListenerSet<StateListener>,
    /// Set while a mutation rewrites the cache, so the cache echo is not
    /// published as an intermediate state.
    applying: Cell<bool>,
}

impl Shared {
    fn publish(&self, next: AuthState) {
        let changed = {
            let mut state = self.state.borrow_mut();
            if let Some(user) = &next.user {
                state.principal = Some(user.id.clone());
            }
            if state.auth == next {
                false
            } else {
                state.auth = next.clone();
                true
            }
        };
        if changed {
            for listener in self.listeners.snapshot() {
                listener(&next);
            }
        }
    }

    fn reconcile(&self, snapshot: &QuerySnapshot) {
        if self.applying.get() {
            return;
        }
        let next = auth::reconcile(&self.state.borrow().auth, snapshot);
        self.publish(next);
    }
}

/// Handle to the session store. Clones share one store; the cache
/// subscription is released when the last clone is dropped.
#[derive(Clone)]
pub struct SessionStore {
    shared: Rc<Shared>,
    api: Rc<dyn ClinicApi>,
    cache: Rc<dyn SessionCache>,
    notifier: Rc<dyn Notifier>,
    ordering: MutationOrdering,
    _cache_subscription: Rc<Subscription>,
}

impl SessionStore {
    /// Create the store in the initial loading state and attach it to the
    /// cache's session entry.
    pub fn new(
        api: Rc<dyn ClinicApi>,
        cache: Rc<dyn SessionCache>,
        notifier: Rc<dyn Notifier>,
        ordering: MutationOrdering,
    ) -> Self {
        let shared = Rc::new(Shared {
            state: RefCell::new(StoreState {
                auth: AuthState::default(),
                last_ticket: 0,
                applied_ticket: 0,
                principal: None,
            }),
            listeners: ListenerSet::new(),
            applying: Cell::new(false),
        });

        let weak: Weak<Shared> = Rc::downgrade(&shared);
        let subscription = cache.subscribe(
            SESSION_KEY,
            Rc::new(move |snapshot: &QuerySnapshot| {
                if let Some(shared) = weak.upgrade() {
                    shared.reconcile(snapshot);
                }
            }),
        );

        let existing = cache.snapshot(SESSION_KEY);
        if existing != QuerySnapshot::default() {
            shared.reconcile(&existing);
        }

        Self { shared, api, cache, notifier, ordering, _cache_subscription: Rc::new(subscription) }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.shared.state.borrow().auth.clone()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.shared.state.borrow().auth.role()
    }

    /// Register for every state transition. Dropping the handle unsubscribes.
    pub fn subscribe(&self, listener: impl Fn(&AuthState) + 'static) -> Subscription {
        self.shared.listeners.add(Rc::new(listener))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.len()
    }

    #[must_use]
    pub fn cache(&self) -> Rc<dyn SessionCache> {
        Rc::clone(&self.cache)
    }

    #[must_use]
    pub fn api(&self) -> Rc<dyn ClinicApi> {
        Rc::clone(&self.api)
    }

    /// Ask the backend who is logged in, through the cache so concurrent
    /// probes share one request. Failures end up in `AuthState::error`.
    pub async fn probe(&self) -> AuthState {
        let api = Rc::clone(&self.api);
        let fetcher: Fetcher = Box::new(move || {
            Box::pin(async move {
                match api.me().await {
                    Ok(Some(payload)) => serde_json::to_value(payload).map_err(|e| QueryError::Failed(e.to_string())),
                    Ok(None) => Ok(Value::Null),
                    Err(e) => Err(QueryError::Failed(e.to_string())),
                }
            })
        });
        if let Err(e) = self.cache.fetch(SESSION_KEY, fetcher).await {
            tracing::warn!(error = %e, "session probe failed");
        }
        // Also covers a cache hit, which does not notify.
        self.shared.reconcile(&self.cache.snapshot(SESSION_KEY));
        self.state()
    }

    /// Probe again even if the cached session is fresh.
    pub async fn refresh(&self) -> AuthState {
        self.cache.invalidate(SESSION_KEY);
        self.probe().await
    }

    /// Authenticate with the backend and make the returned identity current.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingCredentials`] if either field is blank (no request is made).
    /// - [`SessionError::Login`] if the backend rejected the credentials or was unreachable.
    /// - [`SessionError::Superseded`] under `LastIssued` ordering when a newer mutation won.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let ticket = self.issue_ticket();
        tracing::debug!(username, ticket, "login issued");
        let request = LoginRequest { username: username.to_owned(), password: password.to_owned() };
        let result = self.api.login(&request).await;

        if !self.claim(ticket) {
            tracing::info!(username, ticket, "login result superseded");
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(payload) => {
                let user_id = payload.user.id.clone();
                let other_principal =
                    self.shared.state.borrow().principal.as_ref().is_some_and(|p| *p != user_id);
                let cached = serde_json::to_value(&payload);
                self.rewrite_cache(|cache| {
                    if other_principal {
                        cache.clear();
                    }
                    match cached {
                        Ok(value) => {
                            cache.set_data(SESSION_KEY, value);
                            cache.invalidate(SESSION_KEY);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "could not cache session payload");
                            cache.remove(SESSION_KEY);
                        }
                    }
                });
                tracing::info!(user = %user_id, role = %payload.user.role, "signed in");
                self.notifier.notify(Toast::success(format!("Welcome back, {}", payload.user.name)));
                self.shared.publish(AuthState::signed_in(payload));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(username, error = %e, transport = e.is_transport(), "login failed");
                self.rewrite_cache(|cache| cache.clear());
                self.shared.state.borrow_mut().principal = None;
                let message = e.to_string();
                self.notifier.notify(Toast::error(message.clone()));
                self.shared.publish(AuthState::failed(message));
                Err(SessionError::Login(e))
            }
        }
    }

    /// End the session. Succeeds without a request when already signed out.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Logout`] if the backend did not confirm; the state is left as is.
    /// - [`SessionError::Superseded`] under `LastIssued` ordering when a newer mutation won.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let already_out = {
            let state = self.shared.state.borrow();
            state.auth.user.is_none() && !state.auth.is_loading
        };
        let ticket = self.issue_ticket();
        if already_out {
            // Still the latest mutation as far as `LastIssued` is concerned.
            tracing::debug!(ticket, "logout while signed out");
            self.claim(ticket);
            self.sign_out_locally();
            return Ok(());
        }

        tracing::debug!(ticket, "logout issued");
        let result = match self.api.logout().await {
            // No session on the server is the outcome we asked for.
            Err(ApiError::Rejected { status: 401, .. }) => Ok(()),
            other => other,
        };

        match result {
            Ok(()) => {
                if !self.claim(ticket) {
                    tracing::info!(ticket, "logout result superseded");
                    return Err(SessionError::Superseded);
                }
                self.sign_out_locally();
                tracing::info!("signed out");
                self.notifier.notify(Toast::success("Signed out"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, transport = e.is_transport(), "logout failed");
                self.notifier.notify(Toast::error(format!("Could not sign out: {e}")));
                Err(SessionError::Logout(e))
            }
        }
    }

    fn sign_out_locally(&self) {
        self.rewrite_cache(|cache| cache.clear());
        self.shared.state.borrow_mut().principal = None;
        self.shared.publish(AuthState::signed_out());
    }

    fn rewrite_cache(&self, apply: impl FnOnce(&dyn SessionCache)) {
        self.shared.applying.set(true);
        apply(self.cache.as_ref());
        self.shared.applying.set(false);
    }

    fn issue_ticket(&self) -> u64 {
        let mut state = self.shared.state.borrow_mut();
        state.last_ticket += 1;
        state.last_ticket
    }

    /// Decide whether a settled mutation may be applied, recording it if so.
    fn claim(&self, ticket: u64) -> bool {
        let mut state = self.shared.state.borrow_mut();
        match self.ordering {
            MutationOrdering::LastSettled => {
                state.applied_ticket = state.applied_ticket.max(ticket);
                true
            }
            MutationOrdering::LastIssued => {
                if ticket > state.applied_ticket {
                    state.applied_ticket = ticket;
                    true
                } else {
                    false
                }
            }
        }
    }
}
