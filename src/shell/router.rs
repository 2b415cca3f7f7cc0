//! In-process router: current path plus visit history.

use std::cell::RefCell;

use crate::util::auth::Navigator;

#[derive(Debug)]
pub struct Router {
    current: RefCell<String>,
    history: RefCell<Vec<String>>,
}

impl Router {
    #[must_use]
    pub fn new(start: impl Into<String>) -> Self {
        Self { current: RefCell::new(start.into()), history: RefCell::new(Vec::new()) }
    }

    #[must_use]
    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    #[must_use]
    pub fn is_at(&self, path: &str) -> bool {
        *self.current.borrow() == path
    }

    /// Paths navigated to, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl Navigator for Router {
    fn navigate(&self, path: &str) {
        tracing::debug!(from = %self.current.borrow(), to = path, "navigate");
        *self.current.borrow_mut() = path.to_owned();
        self.history.borrow_mut().push(path.to_owned());
    }
}
