//! API module - HTTP handlers and middleware.

pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::access_control_service::AccessControlService;
use crate::services::auth_service::AuthService;
use crate::services::group_service::GroupService;
use crate::services::module_service::ModuleService;
use crate::services::permission_service::PermissionService;
use crate::services::role_service::RoleService;
use crate::services::user_service::UserService;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub auth: Arc<AuthService>,
    pub access: Arc<AccessControlService>,
    pub users: Arc<UserService>,
    pub groups: Arc<GroupService>,
    pub roles: Arc<RoleService>,
    pub modules: Arc<ModuleService>,
    pub permissions: Arc<PermissionService>,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let config_arc = Arc::new(config.clone());
        let auth = Arc::new(AuthService::new(db.clone(), config_arc.clone()));
        let access = Arc::new(AccessControlService::new(db.clone()));
        let users = Arc::new(UserService::new(db.clone(), config_arc, access.clone()));
        let groups = Arc::new(GroupService::new(db.clone(), access.clone()));
        let roles = Arc::new(RoleService::new(db.clone(), access.clone()));
        let modules = Arc::new(ModuleService::new(db.clone(), access.clone()));
        let permissions = Arc::new(PermissionService::new(db.clone(), access.clone()));

        Self {
            config,
            db,
            auth,
            access,
            users,
            groups,
            roles,
            modules,
            permissions,
        }
    }
}

pub type SharedState = Arc<AppState>;
