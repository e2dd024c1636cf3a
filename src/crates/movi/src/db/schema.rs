//! Physical schema verification
//!
//! The tool layer's SQL is written against specific column names
//! (`stops.name`, `paths.path_name`, `routes.route_name`,
//! `vehicles.registration_number`). Column-name drift has historically
//! surfaced as runtime failures on first use; this module rejects it at
//! boot instead. The drivers table is special-cased: `status` is optional
//! and the driver queries adapt their projection to its presence.

use sqlx::Row;

use crate::db::DatabasePool;
use crate::error::{AgentError, ErrorKind, Result};

/// Columns every deployment must have, per table
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("stops", &["name", "latitude", "longitude"]),
    ("paths", &["path_name"]),
    ("path_stops", &["path_id", "stop_id", "seq"]),
    ("routes", &["route_name", "path_id", "shift_time", "direction"]),
    ("vehicles", &["registration_number", "capacity", "status"]),
    ("drivers", &["name", "shift_start", "shift_end"]),
    (
        "trips",
        &["display_name", "route_id", "trip_date", "scheduled_time", "live_status", "capacity"],
    ),
    ("deployments", &["trip_id", "vehicle_id", "driver_id"]),
    ("bookings", &["trip_id", "employee_name", "office", "status"]),
    ("audit_log", &["action", "entity_type", "entity_id", "user_id"]),
];

/// Whether a table carries a column
pub async fn has_column(pool: &DatabasePool, table: &str, column: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM pragma_table_info(?) WHERE name = ?")
        .bind(table)
        .bind(column)
        .fetch_one(pool)
        .await?;
    let count: i64 = row.get("n");
    Ok(count > 0)
}

/// Verify every column the tools depend on exists
///
/// Returns an error listing all missing columns; call at boot, after
/// migrations.
pub async fn verify(pool: &DatabasePool) -> Result<()> {
    let mut missing = Vec::new();
    for (table, columns) in REQUIRED_COLUMNS {
        for column in *columns {
            if !has_column(pool, table, column).await? {
                missing.push(format!("{}.{}", table, column));
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AgentError::domain(
            ErrorKind::Internal,
            format!("schema verification failed; missing columns: {}", missing.join(", ")),
        ))
    }
}

/// Whether the drivers table carries a `status` column
///
/// Some deployments predate the column; driver queries project NULL in
/// its place when absent.
pub async fn drivers_have_status(pool: &DatabasePool) -> Result<bool> {
    has_column(pool, "drivers", "status").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn migrated_pool() -> DatabasePool {
        let db = Database::with_max_connections("sqlite::memory:", 1)
            .await
            .unwrap();
        db.run_migrations().await.unwrap();
        db.pool()
    }

    #[tokio::test]
    async fn test_verify_passes_on_migrated_schema() {
        let pool = migrated_pool().await;
        verify(&pool).await.unwrap();
        assert!(drivers_have_status(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_column_is_reported() {
        let pool = migrated_pool().await;
        // Simulate column drift the way it historically happened: a
        // rename migration applied out of band.
        sqlx::query("ALTER TABLE stops RENAME COLUMN name TO stop_name")
            .execute(&pool)
            .await
            .unwrap();
        let err = verify(&pool).await.unwrap_err();
        assert!(err.to_string().contains("stops.name"));
    }
}
