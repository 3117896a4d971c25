//! Role model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Role entity: a named bundle of permissions.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
