//! Role management handlers.

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
use crate::models::permission::{ActionKind, PermissionWithModule};
use crate::models::role::Role;

/// Create role routes, each method gated on the "roles" module.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let read_routes = Router::new()
        .route("/", get(list_roles))
        .route("/:id", get(get_role))
        .route("/:id/permissions", get(get_role_permissions))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "roles", ActionKind::Read),
            check_permission,
        ));

    let create_routes = Router::new()
        .route("/", post(create_role))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "roles", ActionKind::Create),
            check_permission,
        ));

    let update_routes = Router::new()
        .route("/:id", put(update_role))
        .route("/:id/permissions", post(assign_permissions))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "roles", ActionKind::Update),
            check_permission,
        ));

    let delete_routes = Router::new()
        .route("/:id", delete(delete_role))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "roles", ActionKind::Delete),
            check_permission,
        ));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}

/// List roles
pub async fn list_roles(State(state): State<SharedState>) -> Result<Json<Vec<Role>>> {
    let roles = state.roles.list_roles().await?;
    Ok(Json(roles))
}

/// Get a role by ID
pub async fn get_role(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Role>> {
    let role = state.roles.get_role(id).await?;
    Ok(Json(role))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Create a role
pub async fn create_role(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>)> {
    let role = state
        .roles
        .create_role(&payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update a role
pub async fn update_role(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<Role>> {
    let role = state
        .roles
        .update_role(id, payload.name, payload.description)
        .await?;

    Ok(Json(role))
}

/// Delete a role
pub async fn delete_role(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.roles.delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    #[serde(rename = "permissionIds")]
    pub permission_ids: Vec<i64>,
}

/// Replace the role's permission set
pub async fn assign_permissions(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignPermissionsRequest>,
) -> Result<StatusCode> {
    state
        .roles
        .assign_permissions(id, &payload.permission_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Permissions bundled by the role
pub async fn get_role_permissions(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PermissionWithModule>>> {
    let permissions = state.roles.role_permissions(id).await?;
    Ok(Json(permissions))
}
