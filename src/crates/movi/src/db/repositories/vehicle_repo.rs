//! Vehicle repository for database operations

use sqlx::FromRow;

use crate::db::models::Vehicle;
use crate::db::DatabasePool;

/// Vehicle with its deployment count, for usage analytics
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct VehicleUsage {
    /// Registration plate
    pub registration_number: String,
    /// Deployments recorded
    pub deployments: i64,
}

/// Vehicle repository
pub struct VehicleRepository;

impl VehicleRepository {
    /// All vehicles
    pub async fn list_all(pool: &DatabasePool) -> Result<Vec<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY registration_number")
            .fetch_all(pool)
            .await
    }

    /// Get a vehicle by id
    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Vehicles matching a registration plate (case-insensitive)
    pub async fn find_by_registration(
        pool: &DatabasePool,
        registration: &str,
    ) -> Result<Vec<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE registration_number = ? COLLATE NOCASE",
        )
        .bind(registration)
        .fetch_all(pool)
        .await
    }

    /// Register a new vehicle
    pub async fn create(
        pool: &DatabasePool,
        registration_number: &str,
        capacity: i64,
    ) -> Result<Vehicle, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "INSERT INTO vehicles (registration_number, capacity, status)
             VALUES (?, ?, 'active')
             RETURNING *",
        )
        .bind(registration_number)
        .bind(capacity)
        .fetch_one(pool)
        .await
    }

    /// Set a vehicle's operational status
    pub async fn set_status(
        pool: &DatabasePool,
        id: i64,
        status: &str,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET status = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deployable vehicles with no deployment on a date
    pub async fn unassigned_on_date(
        pool: &DatabasePool,
        date: &str,
    ) -> Result<Vec<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT v.* FROM vehicles v
             WHERE v.status NOT IN ('maintenance', 'blocked')
               AND v.id NOT IN (
                   SELECT d.vehicle_id FROM deployments d
                   JOIN trips t ON t.id = d.trip_id
                   WHERE d.vehicle_id IS NOT NULL AND t.trip_date = ?
                     AND t.live_status NOT IN ('CANCELLED', 'COMPLETED')
               )
             ORDER BY v.registration_number",
        )
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Vehicles ranked by total deployments
    pub async fn usage_ranking(
        pool: &DatabasePool,
        limit: i64,
    ) -> Result<Vec<VehicleUsage>, sqlx::Error> {
        sqlx::query_as::<_, VehicleUsage>(
            "SELECT v.registration_number, COUNT(d.id) AS deployments
             FROM vehicles v
             LEFT JOIN deployments d ON d.vehicle_id = v.id
             GROUP BY v.id
             ORDER BY deployments DESC, v.registration_number
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
