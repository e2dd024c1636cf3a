//! Audit log repository
//!
//! Every successful mutation writes exactly one entry. Writes are
//! fire-and-forget from the caller's perspective: failures are logged and
//! never surface as user-visible errors.

use chrono::Utc;
use tracing::warn;

use crate::db::models::AuditEntry;
use crate::db::DatabasePool;

/// Audit repository
pub struct AuditRepository;

impl AuditRepository {
    /// Write one audit entry
    pub async fn record(
        pool: &DatabasePool,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        user_id: i64,
        before: Option<&serde_json::Value>,
        after: Option<&serde_json::Value>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audit_log
                (action, entity_type, entity_id, user_id, before_snapshot, after_snapshot, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(user_id)
        .bind(before.map(|v| v.to_string()))
        .bind(after.map(|v| v.to_string()))
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Write one audit entry, swallowing failures
    ///
    /// Audit failures must not fail the mutation that already happened.
    pub async fn record_best_effort(
        pool: &DatabasePool,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        user_id: i64,
        before: Option<&serde_json::Value>,
        after: Option<&serde_json::Value>,
    ) {
        if let Err(e) =
            Self::record(pool, action, entity_type, entity_id, user_id, before, after).await
        {
            warn!(action = %action, error = %e, "audit write failed");
        }
    }

    /// Most recent entries, newest first
    pub async fn recent(
        pool: &DatabasePool,
        limit: i64,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Total number of entries
    pub async fn count(pool: &DatabasePool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
