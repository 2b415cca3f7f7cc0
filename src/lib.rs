//! Session and role-based access control core for the clinic CRM dashboard.
//!
//! ARCHITECTURE
//! ============
//! - `net`: backend boundary (`ClinicApi`) and wire types.
//! - `state`: query cache, session store and the scope views read it from.
//! - `util`: route guard and toast notifications.
//! - `nav`: role-gated menus and pending counts.
//! - `shell`: terminal front end hosting the views.
//!
//! Everything is single-threaded: shared state lives in `Rc<RefCell<_>>`
//! and futures are not required to be `Send`.

pub mod config;
pub mod nav;
pub mod net;
pub mod shell;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
