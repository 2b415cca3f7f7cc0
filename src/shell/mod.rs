//! Terminal front end hosting the consumer tree.
//!
//! SYSTEM CONTEXT
//! ==============
//! The shell plays the part of the browser: a router with a current path,
//! a header and sidebar derived from the session store, and protected pages
//! mounted behind the route guard. Commands arrive one line at a time.

pub mod app;
pub mod command;
pub mod router;
pub mod views;

pub use app::{Shell, Step};

use crate::config::ConfigError;
use crate::net::api::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend client error: {0}")]
    Api(#[from] ApiError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
}
