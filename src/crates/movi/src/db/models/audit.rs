//! Audit log model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One audit trail entry, written by every successful mutation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    /// Row id
    pub id: i64,

    /// Action performed
    pub action: String,

    /// Entity category touched
    pub entity_type: String,

    /// Entity row id, when applicable
    pub entity_id: Option<i64>,

    /// Acting user
    pub user_id: i64,

    /// JSON snapshot before the mutation
    pub before_snapshot: Option<String>,

    /// JSON snapshot after the mutation
    pub after_snapshot: Option<String>,

    /// Creation timestamp (ISO-8601)
    pub created_at: String,
}
