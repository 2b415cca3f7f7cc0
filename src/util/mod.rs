//! Shared helpers for views.

pub mod auth;
pub mod toast;
