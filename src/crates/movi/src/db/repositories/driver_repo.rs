//! Driver repository for database operations
//!
//! The drivers table may or may not carry a `status` column depending on
//! deployment age; callers pass the boot-time introspection result and
//! the projection adapts (NULL is selected in place of the column).

use crate::db::models::Driver;
use crate::db::DatabasePool;

fn projection(has_status: bool) -> &'static str {
    if has_status {
        "SELECT id, name, shift_start, shift_end, status FROM drivers"
    } else {
        "SELECT id, name, shift_start, shift_end, NULL AS status FROM drivers"
    }
}

/// Driver repository
pub struct DriverRepository;

impl DriverRepository {
    /// All drivers
    pub async fn list_all(
        pool: &DatabasePool,
        has_status: bool,
    ) -> Result<Vec<Driver>, sqlx::Error> {
        sqlx::query_as::<_, Driver>(&format!("{} ORDER BY name", projection(has_status)))
            .fetch_all(pool)
            .await
    }

    /// Get a driver by id
    pub async fn get_by_id(
        pool: &DatabasePool,
        id: i64,
        has_status: bool,
    ) -> Result<Option<Driver>, sqlx::Error> {
        sqlx::query_as::<_, Driver>(&format!("{} WHERE id = ?", projection(has_status)))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Drivers matching a name
    ///
    /// Exact case-insensitive match first; falls back to first-token
    /// match ("Sarah" matches "Sarah Johnson") when nothing matched.
    pub async fn find_by_name(
        pool: &DatabasePool,
        name: &str,
        has_status: bool,
    ) -> Result<Vec<Driver>, sqlx::Error> {
        let exact = sqlx::query_as::<_, Driver>(&format!(
            "{} WHERE name = ? COLLATE NOCASE ORDER BY name",
            projection(has_status)
        ))
        .bind(name)
        .fetch_all(pool)
        .await?;
        if !exact.is_empty() {
            return Ok(exact);
        }
        sqlx::query_as::<_, Driver>(&format!(
            "{} WHERE name LIKE ? COLLATE NOCASE ORDER BY name",
            projection(has_status)
        ))
        .bind(format!("{}%", name.trim()))
        .fetch_all(pool)
        .await
    }

    /// Register a new driver
    pub async fn create(
        pool: &DatabasePool,
        name: &str,
        shift_start: &str,
        shift_end: &str,
        has_status: bool,
    ) -> Result<Driver, sqlx::Error> {
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO drivers (name, shift_start, shift_end)
             VALUES (?, ?, ?)
             RETURNING id",
        )
        .bind(name)
        .bind(shift_start)
        .bind(shift_end)
        .fetch_one(pool)
        .await?;
        Self::get_by_id(pool, id.0, has_status)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Set a driver's availability status
    ///
    /// No-op (returning the unchanged row) when the deployment has no
    /// status column to write.
    pub async fn set_status(
        pool: &DatabasePool,
        id: i64,
        status: &str,
        has_status: bool,
    ) -> Result<Option<Driver>, sqlx::Error> {
        if has_status {
            sqlx::query("UPDATE drivers SET status = ? WHERE id = ?")
                .bind(status)
                .bind(id)
                .execute(pool)
                .await?;
        }
        Self::get_by_id(pool, id, has_status).await
    }
}
