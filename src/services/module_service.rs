//! Module management service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{AppError, Result};
use crate::models::module::Module;
use crate::models::permission::{ActionKind, Permission};
use crate::services::access_control_service::AccessControlService;

/// Module list entry with the actions already defined for it.
#[derive(Debug, Serialize)]
pub struct ModuleWithActions {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub permissions: Vec<ActionKind>,
}

#[derive(FromRow)]
struct ModuleListRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    permissions: Option<String>,
}

/// Module management service
pub struct ModuleService {
    db: SqlitePool,
    access: Arc<AccessControlService>,
}

impl ModuleService {
    pub fn new(db: SqlitePool, access: Arc<AccessControlService>) -> Self {
        Self { db, access }
    }

    /// List all modules with their defined actions
    pub async fn list_modules(&self) -> Result<Vec<ModuleWithActions>> {
        let rows: Vec<ModuleListRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.name, m.description, m.created_at, m.updated_at,
                   group_concat(p.action) AS permissions
            FROM modules m
            LEFT JOIN permissions p ON m.id = p.module_id
            GROUP BY m.id, m.name, m.description, m.created_at, m.updated_at
            ORDER BY m.id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let permissions = match row.permissions {
                    Some(actions) => actions
                        .split(',')
                        .map(|a| {
                            a.parse::<ActionKind>()
                                .map_err(AppError::Internal)
                        })
                        .collect::<Result<Vec<_>>>()?,
                    None => Vec::new(),
                };
                Ok(ModuleWithActions {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    permissions,
                })
            })
            .collect()
    }

    /// Get a module by ID
    pub async fn get_module(&self, id: i64) -> Result<Module> {
        sqlx::query_as(
            "SELECT id, name, description, created_at, updated_at FROM modules WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Module not found".to_string()))
    }

    /// Create a module
    pub async fn create_module(&self, name: &str, description: Option<&str>) -> Result<Module> {
        let module: Module = sqlx::query_as(
            r#"
            INSERT INTO modules (name, description)
            VALUES (?, ?)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Module name already exists"))?;

        Ok(module)
    }

    /// Update a module; renames change what resolved permission sets are
    /// keyed by, so the cache is invalidated.
    pub async fn update_module(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Module> {
        let current = self.get_module(id).await?;

        let name = name.unwrap_or(current.name);
        let description = description.or(current.description);

        let module: Module = sqlx::query_as(
            r#"
            UPDATE modules
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
        .map_err(|e| AppError::conflict_on_unique(e, "Module name already exists"))?;

        self.access.invalidate();
        Ok(module)
    }

    /// Delete a module; its permissions cascade with it.
    pub async fn delete_module(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM modules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Module not found".to_string()));
        }

        self.access.invalidate();
        Ok(())
    }

    /// Permissions defined for a module
    pub async fn module_permissions(&self, module_id: i64) -> Result<Vec<Permission>> {
        self.get_module(module_id).await?;

        let permissions = sqlx::query_as(
            r#"
            SELECT id, module_id, action, created_at, updated_at
            FROM permissions
            WHERE module_id = ?
            ORDER BY id
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }
}
