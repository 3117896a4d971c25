//! Module management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::permission::{check_permission, PermissionGate};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::module::Module;
use crate::models::permission::{ActionKind, Permission};
use crate::services::module_service::ModuleWithActions;

/// Create module routes, each method gated on the "modules" module.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let read_routes = Router::new()
        .route("/", get(list_modules))
        .route("/:id", get(get_module))
        .route("/:id/permissions", get(get_module_permissions))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "modules", ActionKind::Read),
            check_permission,
        ));

    let create_routes = Router::new()
        .route("/", post(create_module))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "modules", ActionKind::Create),
            check_permission,
        ));

    let update_routes = Router::new()
        .route("/:id", put(update_module))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "modules", ActionKind::Update),
            check_permission,
        ));

    let delete_routes = Router::new()
        .route("/:id", delete(delete_module))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "modules", ActionKind::Delete),
            check_permission,
        ));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}

/// List modules with their defined actions
pub async fn list_modules(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ModuleWithActions>>> {
    let modules = state.modules.list_modules().await?;
    Ok(Json(modules))
}

/// Get a module by ID
pub async fn get_module(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Module>> {
    let module = state.modules.get_module(id).await?;
    Ok(Json(module))
}

#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Create a module
pub async fn create_module(
    State(state): State<SharedState>,
    Json(payload): Json<CreateModuleRequest>,
) -> Result<(StatusCode, Json<Module>)> {
    let module = state
        .modules
        .create_module(&payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(module)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateModuleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update a module
pub async fn update_module(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateModuleRequest>,
) -> Result<Json<Module>> {
    let module = state
        .modules
        .update_module(id, payload.name, payload.description)
        .await?;

    Ok(Json(module))
}

/// Delete a module
pub async fn delete_module(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.modules.delete_module(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Permissions defined for the module
pub async fn get_module_permissions(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Permission>>> {
    let permissions = state.modules.module_permissions(id).await?;
    Ok(Json(permissions))
}
