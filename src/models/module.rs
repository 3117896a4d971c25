//! Module model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Module entity: a named resource category subject to access control.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Module {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
