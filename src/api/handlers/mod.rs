//! HTTP request handlers.

pub mod auth;
pub mod groups;
pub mod health;
pub mod modules;
pub mod permissions;
pub mod roles;
pub mod users;
