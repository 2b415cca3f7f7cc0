//! Provider tree through which views obtain the session store.
//!
//! DESIGN
//! ======
//! A `Scope` is a node with an optional parent. `provide_session` attaches
//! the store to one node; lookups walk towards the root. Asking for the store
//! outside any provider is a wiring bug, so the `expect_*` helpers panic at
//! setup rather than letting a view run without identity.

#[cfg(test)]
#[path = "scope_test.rs"]
mod scope_test;

use std::cell::RefCell;
use std::rc::Rc;

use super::session::SessionStore;
use crate::net::types::Role;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("no session store provided in this scope or any ancestor")]
    MissingSession,
}

#[derive(Default)]
struct Node {
    parent: Option<Rc<Node>>,
    session: RefCell<Option<SessionStore>>,
}

/// Handle to one node of the view tree. Clones refer to the same node.
#[derive(Clone, Default)]
pub struct Scope {
    node: Rc<Node>,
}

impl Scope {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Make `store` visible to this node and all its descendants.
    pub fn provide_session(&self, store: SessionStore) {
        *self.node.session.borrow_mut() = Some(store);
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self { node: Rc::new(Node { parent: Some(Rc::clone(&self.node)), session: RefCell::new(None) }) }
    }

    /// Nearest provided store.
    ///
    /// # Errors
    ///
    /// [`ScopeError::MissingSession`] when no ancestor provides one.
    pub fn use_session(&self) -> Result<SessionStore, ScopeError> {
        let mut node = Some(&self.node);
        while let Some(current) = node {
            if let Some(store) = current.session.borrow().as_ref() {
                return Ok(store.clone());
            }
            node = current.parent.as_ref();
        }
        Err(ScopeError::MissingSession)
    }

    /// Like [`Scope::use_session`] but panics outside a provider.
    ///
    /// # Panics
    ///
    /// When no ancestor provides a session store.
    #[must_use]
    pub fn expect_session(&self) -> SessionStore {
        match self.use_session() {
            Ok(store) => store,
            Err(e) => panic!("{e}; call Scope::provide_session above this view"),
        }
    }

    /// Role of the current user, if any.
    ///
    /// # Panics
    ///
    /// When no ancestor provides a session store.
    #[must_use]
    pub fn use_role(&self) -> Option<Role> {
        self.expect_session().role()
    }
}
