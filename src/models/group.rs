//! Group model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Group entity: a named bundle of roles that users are members of.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
