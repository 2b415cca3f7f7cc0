//! Networking modules for the auth boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles the REST calls the session core depends on, and `types`
//! defines the shared wire schema.

pub mod api;
pub mod types;
