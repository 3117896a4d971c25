//! User management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::handlers::auth::UserResponse;
use crate::api::middleware::permission::{check_permission, PermissionGate};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::group::Group;
use crate::models::permission::ActionKind;
use crate::services::user_service::{UserUpdate, UserWithGroups};

/// Create user routes, each method gated on the "users" module with the
/// action matching the method.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let read_routes = Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user))
        .route("/:id/groups", get(get_user_groups))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "users", ActionKind::Read),
            check_permission,
        ));

    let create_routes = Router::new()
        .route("/", post(create_user))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "users", ActionKind::Create),
            check_permission,
        ));

    let update_routes = Router::new()
        .route("/:id", put(update_user))
        .route("/:id/groups", post(assign_groups))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "users", ActionKind::Update),
            check_permission,
        ));

    let delete_routes = Router::new()
        .route("/:id", delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(state.access.clone(), "users", ActionKind::Delete),
            check_permission,
        ));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}

/// List users with their group memberships
pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<UserWithGroups>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = state.users.get_user(id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Create a user
pub async fn create_user(
    State(state): State<SharedState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state
        .users
        .create_user(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Update a user
pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .update_user(
            id,
            UserUpdate {
                username: payload.username,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

/// Delete a user
pub async fn delete_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssignGroupsRequest {
    #[serde(rename = "groupId")]
    pub group_ids: Vec<i64>,
}

/// Replace the user's group memberships
pub async fn assign_groups(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignGroupsRequest>,
) -> Result<StatusCode> {
    state.users.assign_groups(id, &payload.group_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Groups the user belongs to
pub async fn get_user_groups(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Group>>> {
    let groups = state.users.user_groups(id).await?;
    Ok(Json(groups))
}
