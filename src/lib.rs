//! RBAC Administration Backend - Library
//!
//! Users belong to groups, groups hold roles, roles bundle permissions,
//! and a permission is a (module, action) pair. The permission resolver
//! and the route-level decision point live in `services` and
//! `api::middleware` respectively.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
