//! Request-level tests through the full router.
//!
//! Cover the enforcement ordering (missing identity -> 401, unknown
//! module -> 400, missing grant -> 403), the auth endpoints, and the
//! assignment flows as they appear on the wire.

mod common;

use axum::http::StatusCode;
use axum::{middleware, routing::get, Router};
use serde_json::json;

use rbac_admin_backend::api::middleware::auth::auth_middleware;
use rbac_admin_backend::api::middleware::permission::{check_permission, PermissionGate};
use rbac_admin_backend::models::permission::ActionKind;

use common::{group_id_by_name, read_json, role_id_by_name, TestContext};

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.request("GET", "/api/v1/users", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await;
    assert_eq!(body["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn malformed_token_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .request("GET", "/api/v1/users", Some("not.a.jwt"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_passes_the_permission_gate() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let response = ctx
        .request("GET", "/api/v1/users", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let admin = body
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "admin")
        .expect("seeded admin in the list");
    assert_eq!(admin["groups"], json!(["System Administrators"]));
}

#[tokio::test]
async fn user_without_the_grant_is_forbidden() {
    let ctx = TestContext::new().await;

    let response = ctx
        .request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "peon",
                "email": "peon@example.com",
                "password": "Secret@123"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = read_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = ctx
        .request("GET", "/api/v1/users", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The body names only the missing requirement.
    let body = read_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["message"], "Permission denied");
    assert_eq!(body["module"], "users");
    assert_eq!(body["action"], "read");

    // The gate runs before the handler: even a nonexistent target id
    // yields 403, not 404.
    let response = ctx
        .request("GET", "/api/v1/users/999999", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_module_requirement_is_a_validation_error() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    // A route gated on a module nobody registered.
    let app = Router::new()
        .route("/widgets", get(|| async { "widgets" }))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::new(ctx.state.access.clone(), "widgets", ActionKind::Read),
            check_permission,
        ))
        .layer(middleware::from_fn_with_state(
            ctx.state.auth.clone(),
            auth_middleware,
        ))
        .with_state(ctx.state.clone());

    use tower::ServiceExt;
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/widgets")
        .header("authorization", format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Module 'widgets' does not exist");
}

#[tokio::test]
async fn failed_logins_get_one_generic_response() {
    let ctx = TestContext::new().await;

    let wrong_password = ctx
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "nope" })),
        )
        .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = read_json(wrong_password).await;

    let unknown_user = ctx
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "nope" })),
        )
        .await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = read_json(unknown_user).await;

    assert_eq!(wrong_password, unknown_user);

    // No identifier at all is a validation problem, not an auth one.
    let response = ctx
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "password": "nope" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registration_is_a_bad_request() {
    let ctx = TestContext::new().await;

    let payload = json!({
        "username": "dupe",
        "email": "dupe@example.com",
        "password": "Secret@123"
    });

    let response = ctx
        .request("POST", "/api/v1/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .request("POST", "/api/v1/auth/register", None, Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn me_and_my_permissions_report_the_effective_set() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let response = ctx
        .request("GET", "/api/v1/auth/me", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["username"], "admin");

    let response = ctx
        .request("GET", "/api/v1/auth/me/permissions", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(
        body["permissions"]["users"],
        json!(["create", "read", "update", "delete"])
    );
    assert_eq!(body["permissions"].as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn simulate_action_dry_runs_the_check() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let response = ctx
        .request(
            "POST",
            "/api/v1/auth/simulate-action",
            Some(&token),
            Some(json!({ "module": "users", "action": "delete" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["hasPermission"], true);

    let response = ctx
        .request(
            "POST",
            "/api/v1/auth/simulate-action",
            Some(&token),
            Some(json!({ "module": "widgets", "action": "read" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["hasPermission"], false);

    let response = ctx
        .request(
            "POST",
            "/api/v1/auth/simulate-action",
            Some(&token),
            Some(json!({ "module": "users", "action": "explode" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn permission_creation_errors_map_to_the_taxonomy() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let users_module_id: i64 = sqlx::query_scalar("SELECT id FROM modules WHERE name = 'users'")
        .fetch_one(ctx.pool())
        .await
        .unwrap();

    // The seed already defined users/read.
    let response = ctx
        .request(
            "POST",
            "/api/v1/permissions",
            Some(&token),
            Some(json!({ "module_id": users_module_id, "action": "read" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "CONFLICT");

    // A permission for a module that does not exist.
    let response = ctx
        .request(
            "POST",
            "/api/v1/permissions",
            Some(&token),
            Some(json!({ "module_id": 9999, "action": "read" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_assignment_flow_grants_access_end_to_end() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;

    // A fresh user cannot list users.
    let response = ctx
        .request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "joiner",
                "email": "joiner@example.com",
                "password": "Secret@123"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let user_token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_i64().unwrap();

    let response = ctx
        .request("GET", "/api/v1/users", Some(&user_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin wires a group holding Super Admin and puts the user in it.
    let response = ctx
        .request(
            "POST",
            "/api/v1/groups",
            Some(&admin),
            Some(json!({ "name": "Operators", "description": "On-call" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group_id = read_json(response).await["id"].as_i64().unwrap();

    let super_admin = role_id_by_name(ctx.pool(), "Super Admin").await;
    let response = ctx
        .request(
            "POST",
            &format!("/api/v1/groups/{group_id}/roles"),
            Some(&admin),
            Some(json!({ "roleIds": [super_admin] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .request(
            "POST",
            &format!("/api/v1/users/{user_id}/groups"),
            Some(&admin),
            Some(json!({ "groupId": [group_id] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The mutation is visible on the very next request.
    let response = ctx
        .request("GET", "/api/v1/users", Some(&user_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn group_names_with_commas_survive_the_user_listing() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let response = ctx
        .request(
            "POST",
            "/api/v1/groups",
            Some(&token),
            Some(json!({ "name": "Ops, East" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group_id = read_json(response).await["id"].as_i64().unwrap();

    let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'admin'")
        .fetch_one(ctx.pool())
        .await
        .unwrap();
    let sysadmins = group_id_by_name(ctx.pool(), "System Administrators").await;

    let response = ctx
        .request(
            "POST",
            &format!("/api/v1/users/{admin_id}/groups"),
            Some(&token),
            Some(json!({ "groupId": [sysadmins, group_id] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .request("GET", "/api/v1/users", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let admin = body
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "admin")
        .unwrap();
    let mut groups: Vec<&str> = admin["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g.as_str().unwrap())
        .collect();
    groups.sort_unstable();
    assert_eq!(groups, vec!["Ops, East", "System Administrators"]);
}

#[tokio::test]
async fn duplicate_group_name_is_a_bad_request() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    // "Regular Users" was seeded.
    let seeded = group_id_by_name(ctx.pool(), "Regular Users").await;
    assert!(seeded > 0);

    let response = ctx
        .request(
            "POST",
            "/api/v1/groups",
            Some(&token),
            Some(json!({ "name": "Regular Users" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let ctx = TestContext::new().await;

    let response = ctx.request("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "healthy");
}
