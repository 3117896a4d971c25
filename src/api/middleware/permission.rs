//! Access decision point.
//!
//! Gates every protected route on a (module, action) requirement fixed at
//! route-registration time. The gate is side-effect-free: it consults the
//! resolver and either lets the request through or rejects it before any
//! handler logic runs. Only the identity is request-derived; the
//! requirement itself never is.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::middleware::auth::AuthExtension;
use crate::error::AppError;
use crate::models::permission::ActionKind;
use crate::services::access_control_service::AccessControlService;

/// Per-route permission requirement, bound at registration.
///
/// The action is an [`ActionKind`], so a route can only ever be registered
/// with one of the four canonical actions; there is no runtime validation
/// to fail late.
#[derive(Clone)]
pub struct PermissionGate {
    access: Arc<AccessControlService>,
    module: &'static str,
    action: ActionKind,
}

impl PermissionGate {
    pub fn new(access: Arc<AccessControlService>, module: &'static str, action: ActionKind) -> Self {
        Self {
            access,
            module,
            action,
        }
    }
}

/// Permission-check middleware.
///
/// Denial order matters: a missing identity is an authentication failure
/// (401), a requirement naming an unregistered module is a configuration
/// error (400), and only an authenticated user lacking the capability gets
/// a 403. The 403 body names the module and action and nothing else.
pub async fn check_permission(
    State(gate): State<PermissionGate>,
    request: Request,
    next: Next,
) -> Response {
    let Some(auth) = request.extensions().get::<AuthExtension>().cloned() else {
        return AppError::Authentication("Authentication required".to_string()).into_response();
    };

    match gate.access.module_exists(gate.module).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(module = gate.module, "Route requires unregistered module");
            return AppError::Validation(format!("Module '{}' does not exist", gate.module))
                .into_response();
        }
        Err(e) => return e.into_response(),
    }

    match gate
        .access
        .check(auth.user_id, gate.module, gate.action)
        .await
    {
        Ok(true) => next.run(request).await,
        Ok(false) => AppError::Authorization {
            module: gate.module.to_string(),
            action: gate.action,
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}
