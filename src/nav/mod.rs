//! Role-gated navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! `menu` turns a role and the pending counts into navigation groups;
//! `counts` loads those counts through the query cache.

pub mod counts;
pub mod menu;
