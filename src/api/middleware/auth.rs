//! Authentication middleware.
//!
//! Extracts and validates the bearer JWT from each request and attaches
//! the verified identity for the permission gate and handlers downstream.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::auth_service::{AuthService, Claims};

/// Extension that holds the verified identity of the requester
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: i64,
    pub username: String,
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware function - requires a valid bearer token.
///
/// The submitted token is never echoed back in an error response.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(&request) else {
        return AppError::Authentication("Missing authorization header".to_string())
            .into_response();
    };

    match auth_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthExtension::from(claims));
            next.run(request).await
        }
        Err(_) => {
            AppError::Authentication("Invalid or expired token".to_string()).into_response()
        }
    }
}
