//! User-facing notifications ("toasts") emitted by session mutations.

#[cfg(test)]
#[path = "toast_test.rs"]
mod toast_test;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: ToastKind::Success, message: message.into() }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: ToastKind::Error, message: message.into() }
    }
}

/// Sink for toasts. The store holds one; views decide how to show them.
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Logs toasts instead of displaying them.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => tracing::info!(message = %toast.message, "toast"),
            ToastKind::Error => tracing::warn!(message = %toast.message, "toast"),
        }
    }
}

/// Buffers toasts until a view drains them. Clones share the buffer.
#[derive(Clone, Debug, Default)]
pub struct ToastQueue {
    pending: Rc<RefCell<VecDeque<Toast>>>,
}

impl ToastQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Toast> {
        self.pending.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        tracing::debug!(kind = ?toast.kind, message = %toast.message, "toast queued");
        self.pending.borrow_mut().push_back(toast);
    }
}
