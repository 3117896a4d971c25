//! Common test utilities for backend integration and handler tests
//!
//! This module provides shared infrastructure for testing:
//! - In-memory SQLite databases with the schema applied
//! - Seeded application state and a full router for request-level tests
//! - Fixture helpers for building user/group/role/permission graphs

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tower::ServiceExt;

use rbac_admin_backend::api::routes::create_router;
use rbac_admin_backend::api::AppState;
use rbac_admin_backend::{db, seed, Config};

/// Password of the seeded admin account in tests
pub const ADMIN_PASSWORD: &str = "Admin@123";

/// Configuration used by every test; low bcrypt cost keeps runs fast.
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        log_level: "debug".to_string(),
        jwt_secret: "test-jwt-secret".to_string(),
        jwt_expiration_secs: 3600,
        bcrypt_cost: 4,
        seed_admin_password: ADMIN_PASSWORD.to_string(),
    }
}

/// In-memory database with migrations applied.
///
/// A single connection keeps every query on the same memory database.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    db::MIGRATOR.run(&pool).await.expect("Migrations failed");
    pool
}

/// Seeded application state over a fresh in-memory database.
pub async fn seeded_state() -> Arc<AppState> {
    let pool = memory_pool().await;
    let config = test_config();
    seed::ensure_seed_data(&pool, &config)
        .await
        .expect("Seeding failed");
    Arc::new(AppState::new(config, pool))
}

/// Test context containing shared resources for tests
pub struct TestContext {
    pub state: Arc<AppState>,
    pub app: Router,
}

impl TestContext {
    /// Seeded state plus the full router, ready for oneshot requests.
    pub async fn new() -> Self {
        let state = seeded_state().await;
        let app = create_router(state.clone());
        Self { state, app }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.state.db
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        body["token"].as_str().expect("token in response").to_string()
    }

    /// Token for the seeded admin account.
    pub async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Send a request through the router.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&value).expect("json body")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails")
    }
}

/// Read a response body as JSON.
pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Seeded permission id for a (module, action) pair.
pub async fn permission_id(pool: &SqlitePool, module: &str, action: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        SELECT p.id FROM permissions p
        JOIN modules m ON p.module_id = m.id
        WHERE m.name = ? AND p.action = ?
        "#,
    )
    .bind(module)
    .bind(action)
    .fetch_one(pool)
    .await
    .expect("seeded permission exists")
}

pub async fn group_id_by_name(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM groups WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("group exists")
}

pub async fn role_id_by_name(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM roles WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("role exists")
}
