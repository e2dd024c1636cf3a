//! Deployment repository for database operations
//!
//! Owns the one-row-per-trip invariant: assignments reuse an existing row
//! (including orphans whose vehicle and driver are both NULL) instead of
//! inserting a second one, which historically tripped the unique
//! constraint on `trip_id`.

use chrono::Utc;

use crate::db::models::{Deployment, Trip};
use crate::db::DatabasePool;

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Deployment repository
pub struct DeploymentRepository;

impl DeploymentRepository {
    /// The deployment row for a trip, if any
    pub async fn for_trip(
        pool: &DatabasePool,
        trip_id: i64,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        sqlx::query_as::<_, Deployment>("SELECT * FROM deployments WHERE trip_id = ?")
            .bind(trip_id)
            .fetch_optional(pool)
            .await
    }

    /// Assign a vehicle to a trip
    ///
    /// Updates the existing row when one exists (orphans included),
    /// inserts otherwise.
    pub async fn assign_vehicle(
        pool: &DatabasePool,
        trip_id: i64,
        vehicle_id: i64,
    ) -> Result<Deployment, sqlx::Error> {
        if let Some(existing) = Self::for_trip(pool, trip_id).await? {
            sqlx::query_as::<_, Deployment>(
                "UPDATE deployments SET vehicle_id = ?, updated_at = ? WHERE id = ? RETURNING *",
            )
            .bind(vehicle_id)
            .bind(now())
            .bind(existing.id)
            .fetch_one(pool)
            .await
        } else {
            sqlx::query_as::<_, Deployment>(
                "INSERT INTO deployments (trip_id, vehicle_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?)
                 RETURNING *",
            )
            .bind(trip_id)
            .bind(vehicle_id)
            .bind(now())
            .bind(now())
            .fetch_one(pool)
            .await
        }
    }

    /// Assign a driver to a trip (same row-reuse discipline)
    pub async fn assign_driver(
        pool: &DatabasePool,
        trip_id: i64,
        driver_id: i64,
    ) -> Result<Deployment, sqlx::Error> {
        if let Some(existing) = Self::for_trip(pool, trip_id).await? {
            sqlx::query_as::<_, Deployment>(
                "UPDATE deployments SET driver_id = ?, updated_at = ? WHERE id = ? RETURNING *",
            )
            .bind(driver_id)
            .bind(now())
            .bind(existing.id)
            .fetch_one(pool)
            .await
        } else {
            sqlx::query_as::<_, Deployment>(
                "INSERT INTO deployments (trip_id, driver_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?)
                 RETURNING *",
            )
            .bind(trip_id)
            .bind(driver_id)
            .bind(now())
            .bind(now())
            .fetch_one(pool)
            .await
        }
    }

    /// Clear the vehicle from a trip's deployment
    ///
    /// Returns the number of rows touched (0 when nothing was assigned).
    pub async fn remove_vehicle(pool: &DatabasePool, trip_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deployments SET vehicle_id = NULL, updated_at = ?
             WHERE trip_id = ? AND vehicle_id IS NOT NULL",
        )
        .bind(now())
        .bind(trip_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Clear the driver from a trip's deployment
    pub async fn remove_driver(pool: &DatabasePool, trip_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deployments SET driver_id = NULL, updated_at = ?
             WHERE trip_id = ? AND driver_id IS NOT NULL",
        )
        .bind(now())
        .bind(trip_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Trips a vehicle is deployed on for a given date
    ///
    /// Optionally excludes one trip (the one being assigned to).
    pub async fn trips_for_vehicle_on_date(
        pool: &DatabasePool,
        vehicle_id: i64,
        date: &str,
        exclude_trip_id: Option<i64>,
    ) -> Result<Vec<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "SELECT t.* FROM trips t
             JOIN deployments d ON d.trip_id = t.id
             WHERE d.vehicle_id = ? AND t.trip_date = ?
               AND t.live_status NOT IN ('CANCELLED', 'COMPLETED')
               AND t.id != COALESCE(?, -1)
             ORDER BY t.scheduled_time",
        )
        .bind(vehicle_id)
        .bind(date)
        .bind(exclude_trip_id)
        .fetch_all(pool)
        .await
    }

    /// Trips a driver is deployed on for a given date
    pub async fn trips_for_driver_on_date(
        pool: &DatabasePool,
        driver_id: i64,
        date: &str,
        exclude_trip_id: Option<i64>,
    ) -> Result<Vec<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "SELECT t.* FROM trips t
             JOIN deployments d ON d.trip_id = t.id
             WHERE d.driver_id = ? AND t.trip_date = ?
               AND t.live_status NOT IN ('CANCELLED', 'COMPLETED')
               AND t.id != COALESCE(?, -1)
             ORDER BY t.scheduled_time",
        )
        .bind(driver_id)
        .bind(date)
        .bind(exclude_trip_id)
        .fetch_all(pool)
        .await
    }

    /// Number of active deployments for a vehicle on a date
    pub async fn vehicle_deployment_count(
        pool: &DatabasePool,
        vehicle_id: i64,
        date: &str,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM deployments d
             JOIN trips t ON t.id = d.trip_id
             WHERE d.vehicle_id = ? AND t.trip_date = ?
               AND t.live_status NOT IN ('CANCELLED', 'COMPLETED')",
        )
        .bind(vehicle_id)
        .bind(date)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
