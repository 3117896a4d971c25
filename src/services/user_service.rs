//! User management service.

use std::sync::Arc;

use bcrypt::hash;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::services::access_control_service::AccessControlService;

/// User list entry with the names of the groups the user belongs to.
#[derive(Debug, Serialize)]
pub struct UserWithGroups {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub groups: Vec<String>,
}

#[derive(FromRow)]
struct UserListRow {
    id: i64,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
    groups: Option<String>,
}

/// Partial update payload for a user.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User management service
pub struct UserService {
    db: SqlitePool,
    config: Arc<Config>,
    access: Arc<AccessControlService>,
}

impl UserService {
    pub fn new(db: SqlitePool, config: Arc<Config>, access: Arc<AccessControlService>) -> Self {
        Self { db, config, access }
    }

    /// List all users with their group memberships
    pub async fn list_users(&self) -> Result<Vec<UserWithGroups>> {
        // char(30) is the record separator; group names may contain commas.
        let rows: Vec<UserListRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.email, u.created_at,
                   group_concat(g.name, char(30)) AS groups
            FROM users u
            LEFT JOIN user_groups ug ON u.id = ug.user_id
            LEFT JOIN groups g ON ug.group_id = g.id
            GROUP BY u.id, u.username, u.email, u.created_at
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserWithGroups {
                id: row.id,
                username: row.username,
                email: row.email,
                created_at: row.created_at,
                groups: row
                    .groups
                    .map(|names| names.split('\u{1e}').map(str::to_string).collect())
                    .unwrap_or_default(),
            })
            .collect())
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<User> {
        sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Create a user (administrative path, no token issued)
    pub async fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = ? OR email = ?)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash(password, self.config.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES (?, ?, ?)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username or email already exists"))?;

        Ok(user)
    }

    /// Update a user; omitted fields keep their current value, a supplied
    /// password is re-hashed before storage.
    pub async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User> {
        let current = self.get_user(id).await?;

        let username = update.username.unwrap_or(current.username);
        let email = update.email.unwrap_or(current.email);

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE (username = ? OR email = ?) AND id != ?)",
        )
        .bind(&username)
        .bind(&email)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = match update.password {
            Some(password) => hash(&password, self.config.bcrypt_cost)
                .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?,
            None => current.password_hash,
        };

        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username or email already exists"))?;

        Ok(user)
    }

    /// Delete a user; membership edges cascade with the row.
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.access.invalidate();
        Ok(())
    }

    /// Replace the user's group memberships with exactly the given set.
    ///
    /// Delete-then-insert inside one transaction: a foreign-key failure on
    /// any group id rolls the whole replacement back, leaving the prior
    /// memberships intact. An empty list clears all memberships.
    pub async fn assign_groups(&self, user_id: i64, group_ids: &[i64]) -> Result<()> {
        // Delete first so the transaction starts with a write and holds the
        // write lock for the whole replacement; the owner check runs inside
        // the same transaction so a concurrently deleted user is a 404,
        // not a silent success.
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM user_groups WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        for group_id in group_ids {
            sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.access.invalidate();
        Ok(())
    }

    /// Groups the user currently belongs to
    pub async fn user_groups(&self, user_id: i64) -> Result<Vec<crate::models::group::Group>> {
        // NotFound for a missing user rather than an empty list
        self.get_user(user_id).await?;

        let groups = sqlx::query_as(
            r#"
            SELECT g.id, g.name, g.description, g.created_at, g.updated_at
            FROM groups g
            JOIN user_groups ug ON g.id = ug.group_id
            WHERE ug.user_id = ?
            ORDER BY g.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(groups)
    }
}
