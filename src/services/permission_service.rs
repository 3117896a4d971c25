//! Permission management service.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::permission::{ActionKind, Permission, PermissionWithModule};
use crate::models::role::Role;
use crate::services::access_control_service::AccessControlService;

/// Permission management service
pub struct PermissionService {
    db: SqlitePool,
    access: Arc<AccessControlService>,
}

impl PermissionService {
    pub fn new(db: SqlitePool, access: Arc<AccessControlService>) -> Self {
        Self { db, access }
    }

    /// List all permissions with module names
    pub async fn list_permissions(&self) -> Result<Vec<PermissionWithModule>> {
        let permissions = sqlx::query_as(
            r#"
            SELECT p.id, p.module_id, m.name AS module_name, p.action,
                   p.created_at, p.updated_at
            FROM permissions p
            JOIN modules m ON p.module_id = m.id
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }

    /// Get a permission by ID, with its module name
    pub async fn get_permission(&self, id: i64) -> Result<PermissionWithModule> {
        sqlx::query_as(
            r#"
            SELECT p.id, p.module_id, m.name AS module_name, p.action,
                   p.created_at, p.updated_at
            FROM permissions p
            JOIN modules m ON p.module_id = m.id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))
    }

    /// Create a permission for an existing module.
    ///
    /// A nonexistent module id is a NotFound, never a silent insert; a
    /// duplicate (module, action) pair is a conflict.
    pub async fn create_permission(&self, module_id: i64, action: ActionKind) -> Result<Permission> {
        let module_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM modules WHERE id = ?)")
                .bind(module_id)
                .fetch_one(&self.db)
                .await?;

        if !module_exists {
            return Err(AppError::NotFound("Module not found".to_string()));
        }

        let permission: Permission = sqlx::query_as(
            r#"
            INSERT INTO permissions (module_id, action)
            VALUES (?, ?)
            RETURNING id, module_id, action, created_at, updated_at
            "#,
        )
        .bind(module_id)
        .bind(action)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, "Permission already exists for this module and action")
        })?;

        Ok(permission)
    }

    /// Update a permission; omitted fields keep their current value
    pub async fn update_permission(
        &self,
        id: i64,
        module_id: Option<i64>,
        action: Option<ActionKind>,
    ) -> Result<Permission> {
        let current = self.get_permission(id).await?;

        let module_id = module_id.unwrap_or(current.module_id);
        let action = action.unwrap_or(current.action);

        let module_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM modules WHERE id = ?)")
                .bind(module_id)
                .fetch_one(&self.db)
                .await?;

        if !module_exists {
            return Err(AppError::NotFound("Module not found".to_string()));
        }

        let permission: Permission = sqlx::query_as(
            r#"
            UPDATE permissions
            SET module_id = ?, action = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING id, module_id, action, created_at, updated_at
            "#,
        )
        .bind(module_id)
        .bind(action)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, "Permission already exists for this module and action")
        })?;

        self.access.invalidate();
        Ok(permission)
    }

    /// Delete a permission; grant edges cascade with the row.
    pub async fn delete_permission(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Permission not found".to_string()));
        }

        self.access.invalidate();
        Ok(())
    }

    /// Roles that currently bundle this permission
    pub async fn permission_roles(&self, permission_id: i64) -> Result<Vec<Role>> {
        self.get_permission(permission_id).await?;

        let roles = sqlx::query_as(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at
            FROM roles r
            JOIN role_permissions rp ON r.id = rp.role_id
            WHERE rp.permission_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(permission_id)
        .fetch_all(&self.db)
        .await?;

        Ok(roles)
    }
}
