//! Authentication service tests.
//!
//! Registration, the login matrix (username/email, wrong password,
//! unknown identifier), token round-trips, and hash-only storage.

mod common;

use rbac_admin_backend::error::AppError;

use common::{seeded_state, ADMIN_PASSWORD};

#[tokio::test]
async fn register_issues_a_token_for_the_fresh_account() {
    let state = seeded_state().await;

    let (token, user) = state
        .auth
        .register("newbie", "newbie@example.com", "Secret@123")
        .await
        .unwrap();

    let claims = state.auth.validate_token(&token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.username, "newbie");
}

#[tokio::test]
async fn register_stores_only_the_password_hash() {
    let state = seeded_state().await;

    let (_, user) = state
        .auth
        .register("hashed", "hashed@example.com", "Secret@123")
        .await
        .unwrap();

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(user.id)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_ne!(stored, "Secret@123");
    assert!(stored.starts_with("$2"));

    // The hash never leaves the service on the wire.
    let serialized = serde_json::to_value(&user).unwrap();
    assert!(serialized.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_username_or_email_is_a_conflict() {
    let state = seeded_state().await;

    state
        .auth
        .register("taken", "taken@example.com", "Secret@123")
        .await
        .unwrap();

    let err = state
        .auth
        .register("taken", "other@example.com", "Secret@123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = state
        .auth
        .register("other", "taken@example.com", "Secret@123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn login_accepts_username_or_email() {
    let state = seeded_state().await;

    let (_, by_username) = state.auth.login("admin", ADMIN_PASSWORD).await.unwrap();
    let (_, by_email) = state
        .auth
        .login("admin@admin.com", ADMIN_PASSWORD)
        .await
        .unwrap();

    assert_eq!(by_username.id, by_email.id);
}

#[tokio::test]
async fn failed_logins_share_one_generic_error() {
    let state = seeded_state().await;

    // Wrong password for a real account and a completely unknown
    // identifier must be indistinguishable.
    let wrong_password = state.auth.login("admin", "not-the-password").await.unwrap_err();
    let unknown_user = state.auth.login("nobody", "whatever").await.unwrap_err();

    match (&wrong_password, &unknown_user) {
        (AppError::Authentication(a), AppError::Authentication(b)) => assert_eq!(a, b),
        other => panic!("expected two authentication errors, got {other:?}"),
    }
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let state = seeded_state().await;

    let err = state.auth.validate_token("not.a.jwt").unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));

    // A token signed with a different secret fails verification.
    use jsonwebtoken::{encode, EncodingKey, Header};
    use rbac_admin_backend::services::auth_service::Claims;

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: 1,
        username: "admin".to_string(),
        iat: now,
        exp: now + 3600,
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let err = state.auth.validate_token(&forged).unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}
