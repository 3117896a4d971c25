//! Business logic services.

pub mod access_control_service;
pub mod auth_service;
pub mod group_service;
pub mod module_service;
pub mod permission_service;
pub mod role_service;
pub mod user_service;
