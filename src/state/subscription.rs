//! Listener registry shared by the query cache and the session store.
//!
//! Listeners are held as `Rc<dyn Fn>` so a notification pass can snapshot
//! the current set, release every borrow, and then invoke callbacks that are
//! free to call back into the owner.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Handle that keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Unsubscribe now instead of at drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}

struct Listeners<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Rc<T>)>,
}

/// Ordered set of listeners of type `T` (usually a `dyn Fn(..)`).
pub(crate) struct ListenerSet<T: ?Sized> {
    inner: Rc<RefCell<Listeners<T>>>,
}

impl<T: ?Sized> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: ?Sized + 'static> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self { inner: Rc::new(RefCell::new(Listeners { next_id: 0, entries: Vec::new() })) }
    }

    pub(crate) fn add(&self, listener: Rc<T>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push((id, listener));
            id
        };
        let weak: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Current listeners in registration order, detached from the registry.
    pub(crate) fn snapshot(&self) -> Vec<Rc<T>> {
        self.inner.borrow().entries.iter().map(|(_, l)| Rc::clone(l)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }
}
