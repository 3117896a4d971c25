//! Permission management handlers.

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
use crate::models::permission::{ActionKind, Permission, PermissionWithModule};
use crate::models::role::Role;

/// Create permission routes, each method gated on the "permissions" module.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let read_routes = Router::new()
        .route("/", get(list_permissions))
        .route("/:id", get(get_permission))
        .route("/:id/roles", get(get_permission_roles))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "permissions", ActionKind::Read),
            check_permission,
        ));

    let create_routes = Router::new()
        .route("/", post(create_permission))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "permissions", ActionKind::Create),
            check_permission,
        ));

    let update_routes = Router::new()
        .route("/:id", put(update_permission))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "permissions", ActionKind::Update),
            check_permission,
        ));

    let delete_routes = Router::new()
        .route("/:id", delete(delete_permission))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "permissions", ActionKind::Delete),
            check_permission,
        ));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}

/// List permissions with module names
pub async fn list_permissions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PermissionWithModule>>> {
    let permissions = state.permissions.list_permissions().await?;
    Ok(Json(permissions))
}

/// Get a permission by ID
pub async fn get_permission(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<PermissionWithModule>> {
    let permission = state.permissions.get_permission(id).await?;
    Ok(Json(permission))
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub module_id: i64,
    pub action: ActionKind,
}

/// Create a permission
pub async fn create_permission(
    State(state): State<SharedState>,
    Json(payload): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<Permission>)> {
    let permission = state
        .permissions
        .create_permission(payload.module_id, payload.action)
        .await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub module_id: Option<i64>,
    pub action: Option<ActionKind>,
}

/// Update a permission
pub async fn update_permission(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<Json<Permission>> {
    let permission = state
        .permissions
        .update_permission(id, payload.module_id, payload.action)
        .await?;

    Ok(Json(permission))
}

/// Delete a permission
pub async fn delete_permission(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.permissions.delete_permission(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Roles bundling the permission
pub async fn get_permission_roles(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Role>>> {
    let roles = state.permissions.permission_roles(id).await?;
    Ok(Json(roles))
}
