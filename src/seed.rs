//! First-boot seed data.
//!
//! Provisions the module catalog, the full module x action permission
//! matrix, the default roles and groups, and an admin account wired
//! through System Administrators -> Super Admin -> every permission.
//! Runs only when the users table is empty.

use bcrypt::hash;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::permission::ActionKind;

const MODULES: [(&str, &str); 5] = [
    ("users", "User management module"),
    ("groups", "Group management module"),
    ("roles", "Role management module"),
    ("modules", "Module management module"),
    ("permissions", "Permission management module"),
];

const ROLES: [(&str, &str); 3] = [
    ("Super Admin", "Has full access to all modules and permissions"),
    ("Admin", "Has access to manage users, groups, and roles"),
    ("User", "Basic user with limited permissions"),
];

const GROUPS: [(&str, &str); 3] = [
    (
        "System Administrators",
        "Group for system administrators with full access",
    ),
    (
        "Administrators",
        "Group for administrators with management access",
    ),
    ("Regular Users", "Group for regular users with basic access"),
];

/// Seed the database on first boot. Returns true when seeding ran.
pub async fn ensure_seed_data(pool: &SqlitePool, config: &Config) -> Result<bool> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count > 0 {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;

    for (name, description) in MODULES {
        let module_id: i64 = sqlx::query_scalar(
            "INSERT INTO modules (name, description) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        for action in ActionKind::ALL {
            sqlx::query("INSERT INTO permissions (module_id, action) VALUES (?, ?)")
                .bind(module_id)
                .bind(action)
                .execute(&mut *tx)
                .await?;
        }
    }

    let mut super_admin_role_id = 0_i64;
    for (name, description) in ROLES {
        let role_id: i64 =
            sqlx::query_scalar("INSERT INTO roles (name, description) VALUES (?, ?) RETURNING id")
                .bind(name)
                .bind(description)
                .fetch_one(&mut *tx)
                .await?;

        if name == "Super Admin" {
            super_admin_role_id = role_id;
        }
    }

    let mut sysadmin_group_id = 0_i64;
    for (name, description) in GROUPS {
        let group_id: i64 =
            sqlx::query_scalar("INSERT INTO groups (name, description) VALUES (?, ?) RETURNING id")
                .bind(name)
                .bind(description)
                .fetch_one(&mut *tx)
                .await?;

        if name == "System Administrators" {
            sysadmin_group_id = group_id;
        }
    }

    // Super Admin bundles every permission
    sqlx::query("INSERT INTO role_permissions (role_id, permission_id) SELECT ?, id FROM permissions")
        .bind(super_admin_role_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO group_roles (group_id, role_id) VALUES (?, ?)")
        .bind(sysadmin_group_id)
        .bind(super_admin_role_id)
        .execute(&mut *tx)
        .await?;

    let password_hash = hash(&config.seed_admin_password, config.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let admin_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?) RETURNING id",
    )
    .bind("admin")
    .bind("admin@admin.com")
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES (?, ?)")
        .bind(admin_id)
        .bind(sysadmin_group_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Seeded modules, permissions, roles, groups, and admin user");
    Ok(true)
}
