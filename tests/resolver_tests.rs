//! Permission resolution tests.
//!
//! Exercise the User -> Group -> Role -> Permission traversal, the
//! consistency between resolve and check, and cache invalidation on
//! assignment mutations.

mod common;

use std::collections::BTreeSet;

use rbac_admin_backend::models::permission::ActionKind;

use common::{group_id_by_name, permission_id, seeded_state};

#[tokio::test]
async fn groupless_user_resolves_to_empty_set() {
    let state = seeded_state().await;

    let user = state
        .users
        .create_user("loner", "loner@example.com", "Secret@123")
        .await
        .unwrap();

    let resolved = state.access.resolve(user.id).await.unwrap();
    assert!(resolved.is_empty());

    assert!(!state
        .access
        .check(user.id, "users", ActionKind::Read)
        .await
        .unwrap());
}

#[tokio::test]
async fn grants_reachable_via_multiple_paths_deduplicate() {
    let state = seeded_state().await;
    let pool = &state.db;

    let user = state
        .users
        .create_user("multi", "multi@example.com", "Secret@123")
        .await
        .unwrap();

    // Two groups, two roles, both roles bundling the same permission.
    let users_read = permission_id(pool, "users", "read").await;
    let role_a = state.roles.create_role("Auditor A", None).await.unwrap();
    let role_b = state.roles.create_role("Auditor B", None).await.unwrap();
    state
        .roles
        .assign_permissions(role_a.id, &[users_read])
        .await
        .unwrap();
    state
        .roles
        .assign_permissions(role_b.id, &[users_read])
        .await
        .unwrap();

    let group_a = state.groups.create_group("Team A", None).await.unwrap();
    let group_b = state.groups.create_group("Team B", None).await.unwrap();
    state
        .groups
        .assign_roles(group_a.id, &[role_a.id])
        .await
        .unwrap();
    state
        .groups
        .assign_roles(group_b.id, &[role_b.id])
        .await
        .unwrap();

    state
        .users
        .assign_groups(user.id, &[group_a.id, group_b.id])
        .await
        .unwrap();

    let resolved = state.access.resolve(user.id).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved["users"], BTreeSet::from([ActionKind::Read]));
}

#[tokio::test]
async fn seeded_admin_holds_the_full_matrix() {
    let state = seeded_state().await;

    let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'admin'")
        .fetch_one(&state.db)
        .await
        .unwrap();

    let resolved = state.access.resolve(admin_id).await.unwrap();
    assert_eq!(resolved.len(), 5);
    for module in ["users", "groups", "roles", "modules", "permissions"] {
        assert_eq!(
            resolved[module],
            BTreeSet::from(ActionKind::ALL),
            "admin should hold every action on {module}"
        );
    }

    assert!(state
        .access
        .check(admin_id, "users", ActionKind::Delete)
        .await
        .unwrap());
}

#[tokio::test]
async fn check_agrees_with_resolve() {
    let state = seeded_state().await;

    let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'admin'")
        .fetch_one(&state.db)
        .await
        .unwrap();
    let fresh = state
        .users
        .create_user("fresh", "fresh@example.com", "Secret@123")
        .await
        .unwrap();

    for user_id in [admin_id, fresh.id] {
        let resolved = state.access.resolve(user_id).await.unwrap();
        for module in ["users", "roles", "widgets"] {
            for action in ActionKind::ALL {
                let resolved_says = resolved
                    .get(module)
                    .is_some_and(|actions| actions.contains(&action));
                let check_says = state.access.check(user_id, module, action).await.unwrap();
                assert_eq!(resolved_says, check_says, "{module}/{action} for {user_id}");
            }
        }
    }
}

#[tokio::test]
async fn module_matching_is_case_sensitive() {
    let state = seeded_state().await;

    let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'admin'")
        .fetch_one(&state.db)
        .await
        .unwrap();

    assert!(state
        .access
        .check(admin_id, "users", ActionKind::Read)
        .await
        .unwrap());
    assert!(!state
        .access
        .check(admin_id, "Users", ActionKind::Read)
        .await
        .unwrap());
    assert!(!state
        .access
        .check(admin_id, "widgets", ActionKind::Read)
        .await
        .unwrap());
}

#[tokio::test]
async fn assignment_mutation_invalidates_cached_sets() {
    let state = seeded_state().await;

    let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'admin'")
        .fetch_one(&state.db)
        .await
        .unwrap();

    // Warm the cache.
    assert!(state
        .access
        .check(admin_id, "users", ActionKind::Read)
        .await
        .unwrap());

    // Strip the seeded group of its roles; the cached set must not
    // survive the mutation.
    let sysadmins = group_id_by_name(&state.db, "System Administrators").await;
    state.groups.assign_roles(sysadmins, &[]).await.unwrap();

    assert!(!state
        .access
        .check(admin_id, "users", ActionKind::Read)
        .await
        .unwrap());
    assert!(state.access.resolve(admin_id).await.unwrap().is_empty());
}
