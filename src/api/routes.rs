//! Route definitions for the API.

use axum::{middleware, routing::get, Router};

use super::handlers;
use super::middleware::auth::auth_middleware;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/healthz", get(handlers::health::health_check))
        // API v1 routes
        .nest("/api/v1", api_v1_routes(&state))
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: &SharedState) -> Router<SharedState> {
    let auth_service = state.auth.clone();

    // Every protected router below runs behind token verification; the
    // permission gates inside each resource router add the per-route
    // (module, action) requirement on top.
    Router::new()
        // Auth routes - split into public and protected
        .nest("/auth", handlers::auth::public_router())
        .nest(
            "/auth",
            handlers::auth::protected_router().layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/users",
            handlers::users::router(state).layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/groups",
            handlers::groups::router(state).layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/roles",
            handlers::roles::router(state).layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/modules",
            handlers::modules::router(state).layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/permissions",
            handlers::permissions::router(state).layer(middleware::from_fn_with_state(
                auth_service,
                auth_middleware,
            )),
        )
}
