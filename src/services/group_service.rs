//! Group management service.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::group::Group;
use crate::models::role::Role;
use crate::services::access_control_service::AccessControlService;

/// Group management service
pub struct GroupService {
    db: SqlitePool,
    access: Arc<AccessControlService>,
}

impl GroupService {
    pub fn new(db: SqlitePool, access: Arc<AccessControlService>) -> Self {
        Self { db, access }
    }

    /// List all groups
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at FROM groups ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(groups)
    }

    /// Get a group by ID
    pub async fn get_group(&self, id: i64) -> Result<Group> {
        sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at FROM groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    /// Create a group
    pub async fn create_group(&self, name: &str, description: Option<&str>) -> Result<Group> {
        let group: Group = sqlx::query_as(
            r#"
            INSERT INTO groups (name, description)
            VALUES (?, ?)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Group name already exists"))?;

        Ok(group)
    }

    /// Update a group; omitted fields keep their current value
    pub async fn update_group(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Group> {
        let current = self.get_group(id).await?;

        let name = name.unwrap_or(current.name);
        let description = description.or(current.description);

        let group: Group = sqlx::query_as(
            r#"
            UPDATE groups
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
        .map_err(|e| AppError::conflict_on_unique(e, "Group name already exists"))?;

        Ok(group)
    }

    /// Delete a group; membership and role edges cascade with the row.
    pub async fn delete_group(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Group not found".to_string()));
        }

        self.access.invalidate();
        Ok(())
    }

    /// Replace the group's role set with exactly the given roles.
    ///
    /// Atomic delete-then-insert; any failed insert (e.g. a role id that
    /// does not exist) rolls back the whole replacement. An empty list
    /// clears the group's roles.
    pub async fn assign_roles(&self, group_id: i64, role_ids: &[i64]) -> Result<()> {
        // Delete first so the transaction starts with a write and holds the
        // write lock for the whole replacement; the owner check runs inside
        // the same transaction so a concurrently deleted group is a 404,
        // not a silent success.
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM group_roles WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM groups WHERE id = ?)")
            .bind(group_id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            return Err(AppError::NotFound("Group not found".to_string()));
        }

        for role_id in role_ids {
            sqlx::query("INSERT INTO group_roles (group_id, role_id) VALUES (?, ?)")
                .bind(group_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.access.invalidate();
        Ok(())
    }

    /// Roles currently held by the group
    pub async fn group_roles(&self, group_id: i64) -> Result<Vec<Role>> {
        self.get_group(group_id).await?;

        let roles = sqlx::query_as(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at
            FROM roles r
            JOIN group_roles gr ON r.id = gr.role_id
            WHERE gr.group_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.db)
        .await?;

        Ok(roles)
    }
}
