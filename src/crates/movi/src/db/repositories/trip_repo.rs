//! Trip repository for database operations

use crate::db::models::Trip;
use crate::db::DatabasePool;

/// Trip repository
pub struct TripRepository;

impl TripRepository {
    /// Get a trip by id
    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Trips whose display name matches a label
    ///
    /// Exact match first; falls back to case-insensitive when nothing
    /// matched exactly.
    pub async fn find_by_label(
        pool: &DatabasePool,
        label: &str,
    ) -> Result<Vec<Trip>, sqlx::Error> {
        let exact = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE display_name = ? ORDER BY trip_date DESC, scheduled_time",
        )
        .bind(label)
        .fetch_all(pool)
        .await?;
        if !exact.is_empty() {
            return Ok(exact);
        }
        sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE display_name = ? COLLATE NOCASE
             ORDER BY trip_date DESC, scheduled_time",
        )
        .bind(label)
        .fetch_all(pool)
        .await
    }

    /// All trips on a service date
    pub async fn list_for_date(
        pool: &DatabasePool,
        date: &str,
    ) -> Result<Vec<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE trip_date = ? ORDER BY scheduled_time",
        )
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Create a trip
    pub async fn create(
        pool: &DatabasePool,
        display_name: &str,
        route_id: Option<i64>,
        trip_date: &str,
        scheduled_time: &str,
        capacity: i64,
    ) -> Result<Trip, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "INSERT INTO trips (display_name, route_id, trip_date, scheduled_time, live_status, capacity)
             VALUES (?, ?, ?, ?, 'SCHEDULED', ?)
             RETURNING *",
        )
        .bind(display_name)
        .bind(route_id)
        .bind(trip_date)
        .bind(scheduled_time)
        .bind(capacity)
        .fetch_one(pool)
        .await
    }

    /// Set a trip's lifecycle status
    pub async fn update_status(
        pool: &DatabasePool,
        id: i64,
        status: &str,
    ) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "UPDATE trips SET live_status = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Update a trip's scheduled time and display name in one statement
    ///
    /// The display name embeds the time; callers rewrite it and pass both
    /// so the two never drift apart.
    pub async fn update_time(
        pool: &DatabasePool,
        id: i64,
        new_time: &str,
        new_display_name: &str,
    ) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "UPDATE trips SET scheduled_time = ?, display_name = ? WHERE id = ? RETURNING *",
        )
        .bind(new_time)
        .bind(new_display_name)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Move a trip to another service date
    pub async fn update_date(
        pool: &DatabasePool,
        id: i64,
        new_date: &str,
    ) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "UPDATE trips SET trip_date = ? WHERE id = ? RETURNING *",
        )
        .bind(new_date)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Clone a trip into a new SCHEDULED row
    pub async fn duplicate(pool: &DatabasePool, source: &Trip) -> Result<Trip, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "INSERT INTO trips (display_name, route_id, trip_date, scheduled_time, live_status, capacity)
             SELECT display_name || ' (copy)', route_id, trip_date, scheduled_time, 'SCHEDULED', capacity
             FROM trips WHERE id = ?
             RETURNING *",
        )
        .bind(source.id)
        .fetch_one(pool)
        .await
    }

    /// Number of trips attached to a route
    pub async fn count_for_route(pool: &DatabasePool, route_id: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips WHERE route_id = ?")
            .bind(route_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Today's trips missing a vehicle or a driver
    pub async fn needing_attention(
        pool: &DatabasePool,
        date: &str,
    ) -> Result<Vec<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "SELECT t.* FROM trips t
             LEFT JOIN deployments d ON d.trip_id = t.id
             WHERE t.trip_date = ?
               AND t.live_status NOT IN ('CANCELLED', 'COMPLETED')
               AND (d.id IS NULL OR d.vehicle_id IS NULL OR d.driver_id IS NULL)
             ORDER BY t.scheduled_time",
        )
        .bind(date)
        .fetch_all(pool)
        .await
    }
}
