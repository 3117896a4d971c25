//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::permission::ActionKind;
use crate::models::user::User;

/// Create public auth routes (no auth required)
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Create protected auth routes (auth required)
pub fn protected_router() -> Router<SharedState> {
    Router::new()
        .route("/me", get(get_current_user))
        .route("/me/permissions", get(get_my_permissions))
        .route("/simulate-action", post(simulate_action))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// Register a new user
pub async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (token, user) = state
        .auth
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// Login with username or email plus password
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let identifier = payload
        .username
        .or(payload.email)
        .ok_or_else(|| AppError::Validation("Username or email is required".to_string()))?;

    let (token, user) = state.auth.login(&identifier, &payload.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

/// Get current user info
pub async fn get_current_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<UserResponse>> {
    let user = state.auth.get_current_user(auth.user_id).await?;
    Ok(Json(user.into()))
}

/// Effective permission set of the current user, grouped by module
pub async fn get_my_permissions(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Value>> {
    let permissions = state.access.resolve(auth.user_id).await?;
    Ok(Json(json!({ "permissions": &*permissions })))
}

#[derive(Debug, Deserialize)]
pub struct SimulateActionRequest {
    pub module: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct SimulateActionResponse {
    pub success: bool,
    #[serde(rename = "hasPermission")]
    pub has_permission: bool,
    pub message: String,
}

/// Dry-run a permission check for the current user
pub async fn simulate_action(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<SimulateActionRequest>,
) -> Result<Json<SimulateActionResponse>> {
    let action: ActionKind = payload
        .action
        .parse()
        .map_err(AppError::Validation)?;

    let has_permission = state
        .access
        .check(auth.user_id, &payload.module, action)
        .await?;

    let message = if has_permission {
        format!("You have permission to {} on {}", action, payload.module)
    } else {
        format!("You do not have permission to {} on {}", action, payload.module)
    };

    Ok(Json(SimulateActionResponse {
        success: true,
        has_permission,
        message,
    }))
}
