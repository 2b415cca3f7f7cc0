//! Client-side state for the session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! `query_cache` holds server data by key, `session` owns the authoritative
//! `AuthState` derived from it, and `scope` hands the store to views.

pub mod auth;
pub mod query_cache;
pub mod scope;
pub mod session;
pub mod subscription;
