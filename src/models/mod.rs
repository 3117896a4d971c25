//! Database models (SQLx).

pub mod group;
pub mod module;
pub mod permission;
pub mod role;
pub mod user;
