//! Group management handlers.

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
use crate::models::group::Group;
use crate::models::permission::ActionKind;
use crate::models::role::Role;

/// Create group routes, each method gated on the "groups" module.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let read_routes = Router::new()
        .route("/", get(list_groups))
        .route("/:id", get(get_group))
        .route("/:id/roles", get(get_group_roles))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "groups", ActionKind::Read),
            check_permission,
        ));

    let create_routes = Router::new()
        .route("/", post(create_group))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "groups", ActionKind::Create),
            check_permission,
        ));

    let update_routes = Router::new()
        .route("/:id", put(update_group))
        .route("/:id/roles", post(assign_roles))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "groups", ActionKind::Update),
            check_permission,
        ));

    let delete_routes = Router::new()
        .route("/:id", delete(delete_group))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "groups", ActionKind::Delete),
            check_permission,
        ));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}

/// List groups
pub async fn list_groups(State(state): State<SharedState>) -> Result<Json<Vec<Group>>> {
    let groups = state.groups.list_groups().await?;
    Ok(Json(groups))
}

/// Get a group by ID
pub async fn get_group(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Group>> {
    let group = state.groups.get_group(id).await?;
    Ok(Json(group))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Create a group
pub async fn create_group(
    State(state): State<SharedState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>)> {
    let group = state
        .groups
        .create_group(&payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update a group
pub async fn update_group(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<Json<Group>> {
    let group = state
        .groups
        .update_group(id, payload.name, payload.description)
        .await?;

    Ok(Json(group))
}

/// Delete a group
pub async fn delete_group(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.groups.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    #[serde(rename = "roleIds")]
    pub role_ids: Vec<i64>,
}

/// Replace the group's role set
pub async fn assign_roles(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRolesRequest>,
) -> Result<StatusCode> {
    state.groups.assign_roles(id, &payload.role_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Roles held by the group
pub async fn get_group_roles(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Role>>> {
    let roles = state.groups.group_roles(id).await?;
    Ok(Json(roles))
}
