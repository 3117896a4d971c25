//! Role management service.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::permission::PermissionWithModule;
use crate::models::role::Role;
use crate::services::access_control_service::AccessControlService;

/// Role management service
pub struct RoleService {
    db: SqlitePool,
    access: Arc<AccessControlService>,
}

impl RoleService {
    pub fn new(db: SqlitePool, access: Arc<AccessControlService>) -> Self {
        Self { db, access }
    }

    /// List all roles
    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at FROM roles ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(roles)
    }

    /// Get a role by ID
    pub async fn get_role(&self, id: i64) -> Result<Role> {
        sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
    }

    /// Create a role
    pub async fn create_role(&self, name: &str, description: Option<&str>) -> Result<Role> {
        let role: Role = sqlx::query_as(
            r#"
            INSERT INTO roles (name, description)
            VALUES (?, ?)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Role name already exists"))?;

        Ok(role)
    }

    /// Update a role; omitted fields keep their current value
    pub async fn update_role(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Role> {
        let current = self.get_role(id).await?;

        let name = name.unwrap_or(current.name);
        let description = description.or(current.description);

        let role: Role = sqlx::query_as(
            r#"
            UPDATE roles
            SET name = ?, description = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Role name already exists"))?;

        Ok(role)
    }

    /// Delete a role; grant edges cascade, the permissions themselves stay.
    pub async fn delete_role(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Role not found".to_string()));
        }

        self.access.invalidate();
        Ok(())
    }

    /// Replace the role's permission set with exactly the given permissions.
    ///
    /// Atomic delete-then-insert; a failed insert rolls back the whole
    /// replacement so the role never ends up with a partial grant set.
    pub async fn assign_permissions(&self, role_id: i64, permission_ids: &[i64]) -> Result<()> {
        // Delete first so the transaction starts with a write and holds the
        // write lock for the whole replacement; the owner check runs inside
        // the same transaction so a concurrently deleted role is a 404,
        // not a silent success.
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE id = ?)")
            .bind(role_id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            return Err(AppError::NotFound("Role not found".to_string()));
        }

        for permission_id in permission_ids {
            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
                .bind(role_id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.access.invalidate();
        Ok(())
    }

    /// Permissions currently bundled by the role, with module names
    pub async fn role_permissions(&self, role_id: i64) -> Result<Vec<PermissionWithModule>> {
        self.get_role(role_id).await?;

        let permissions = sqlx::query_as(
            r#"
            SELECT p.id, p.module_id, m.name AS module_name, p.action,
                   p.created_at, p.updated_at
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            JOIN modules m ON p.module_id = m.id
            WHERE rp.role_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }
}
