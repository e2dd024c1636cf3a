//! Booking repository for database operations

use sqlx::FromRow;

use crate::db::models::{Booking, Trip};
use crate::db::DatabasePool;

/// Office with its active booking volume
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct OfficeDemand {
    /// Office name
    pub office: String,
    /// Active bookings originating there
    pub bookings: i64,
}

/// Trip with more active bookings than seats
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct OverbookedTrip {
    /// Trip id
    pub id: i64,
    /// Trip display name
    pub display_name: String,
    /// Seat capacity
    pub capacity: i64,
    /// Active bookings
    pub bookings: i64,
}

/// Booking repository
pub struct BookingRepository;

impl BookingRepository {
    /// Active booking count for a trip
    pub async fn active_count(pool: &DatabasePool, trip_id: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE trip_id = ? AND status = 'ACTIVE'",
        )
        .bind(trip_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Active bookings on a trip
    pub async fn list_active(
        pool: &DatabasePool,
        trip_id: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE trip_id = ? AND status = 'ACTIVE'
             ORDER BY employee_name",
        )
        .bind(trip_id)
        .fetch_all(pool)
        .await
    }

    /// Cancel every active booking on a trip
    ///
    /// Returns the number of bookings cancelled.
    pub async fn cancel_all(pool: &DatabasePool, trip_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED'
             WHERE trip_id = ? AND status = 'ACTIVE'",
        )
        .bind(trip_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Trips an employee holds active bookings on
    pub async fn trips_for_employee(
        pool: &DatabasePool,
        employee_name: &str,
    ) -> Result<Vec<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "SELECT DISTINCT t.* FROM trips t
             JOIN bookings b ON b.trip_id = t.id
             WHERE b.employee_name LIKE ? COLLATE NOCASE AND b.status = 'ACTIVE'
             ORDER BY t.trip_date, t.scheduled_time",
        )
        .bind(format!("{}%", employee_name.trim()))
        .fetch_all(pool)
        .await
    }

    /// Offices ranked by active booking volume
    pub async fn office_demand(
        pool: &DatabasePool,
        limit: i64,
    ) -> Result<Vec<OfficeDemand>, sqlx::Error> {
        sqlx::query_as::<_, OfficeDemand>(
            "SELECT office, COUNT(*) AS bookings FROM bookings
             WHERE status = 'ACTIVE' AND office IS NOT NULL
             GROUP BY office
             ORDER BY bookings DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Trips whose active bookings exceed capacity
    pub async fn overbooked(pool: &DatabasePool) -> Result<Vec<OverbookedTrip>, sqlx::Error> {
        sqlx::query_as::<_, OverbookedTrip>(
            "SELECT t.id, t.display_name, t.capacity, COUNT(b.id) AS bookings
             FROM trips t
             JOIN bookings b ON b.trip_id = t.id AND b.status = 'ACTIVE'
             GROUP BY t.id
             HAVING bookings > t.capacity
             ORDER BY bookings - t.capacity DESC",
        )
        .fetch_all(pool)
        .await
    }
}
