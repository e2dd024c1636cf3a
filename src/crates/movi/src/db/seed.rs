//! Demo/seed data
//!
//! Populates an empty database with a small but realistic network so the
//! agent is drivable immediately after boot. Also used by the integration
//! tests, which assert against these fixtures. No-op when trips already
//! exist.

use tracing::info;

use crate::db::DatabasePool;
use crate::error::Result;

/// Seed demo data into an empty database
pub async fn seed_demo_data(pool: &DatabasePool) -> Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        return Ok(());
    }
    info!("Seeding demo data");

    let today = super::repositories::today();

    sqlx::query(
        "INSERT INTO stops (id, name, latitude, longitude) VALUES
            (1, 'Central Depot', 12.9716, 77.5946),
            (2, 'Harbor Gate', 12.9352, 77.6245),
            (3, 'Tech Park', 12.9698, 77.7499),
            (4, 'Airport Road', 13.0550, 77.6500),
            (5, 'Old Town', 12.9141, 77.5900),
            (6, 'Riverside', 12.9900, 77.5700)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO paths (id, path_name) VALUES
            (1, 'Path-1'), (2, 'Path-2'), (3, 'Path-3')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO path_stops (path_id, stop_id, seq) VALUES
            (1, 1, 0), (1, 2, 1), (1, 3, 2),
            (2, 1, 0), (2, 4, 1), (2, 5, 2),
            (3, 2, 0), (3, 5, 1), (3, 6, 2)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO routes (id, route_name, path_id, shift_time, direction) VALUES
            (1, 'Route-A', 1, '07:00', 'up'),
            (2, 'Route-B', 2, '06:00', 'up'),
            (3, 'Route-C', 3, '07:30', 'up')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO vehicles (id, registration_number, capacity, status) VALUES
            (1, 'KA-01-HH-1234', 12, 'active'),
            (2, 'KA-01-HH-5678', 16, 'active'),
            (3, 'KA-02-AB-4321', 12, 'maintenance'),
            (4, 'KA-02-AB-8765', 20, 'active'),
            (5, 'KA-03-CD-1111', 12, 'blocked')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO drivers (id, name, shift_start, shift_end, status) VALUES
            (1, 'Sarah Johnson', '06:00', '14:00', 'active'),
            (2, 'Mike Chen', '06:00', '22:00', 'active'),
            (3, 'Priya Sharma', '12:00', '22:00', 'active'),
            (4, 'Alan Wood', '06:00', '22:00', 'unavailable')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO trips (id, display_name, route_id, trip_date, scheduled_time, live_status, capacity) VALUES
            (1, 'Path-1 - 07:00', 1, ?1, '07:00', 'SCHEDULED', 12),
            (2, 'Path-2 - 06:00', 2, ?1, '06:00', 'SCHEDULED', 12),
            (3, 'Path-3 - 07:30', 3, ?1, '07:30', 'SCHEDULED', 12),
            (4, 'Path-1 - 09:00', 1, ?1, '09:00', 'SCHEDULED', 16),
            (5, 'Path-2 - 10:30', 2, ?1, '10:30', 'SCHEDULED', 12),
            (6, 'Path-3 - 13:00', 3, ?1, '13:00', 'SCHEDULED', 12),
            (7, 'Path-1 - 17:30', 1, ?1, '17:30', 'SCHEDULED', 20),
            (8, 'Bulk - 00:01', 2, ?1, '09:15', 'SCHEDULED', 16)",
    )
    .bind(&today)
    .execute(pool)
    .await?;

    // Trip 5 carries an orphaned deployment row (both assignments NULL);
    // assigning to it must UPDATE, not INSERT.
    sqlx::query(
        "INSERT INTO deployments (trip_id, vehicle_id, driver_id, created_at, updated_at) VALUES
            (1, 1, 2, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z'),
            (4, 2, 2, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z'),
            (5, NULL, NULL, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO bookings (trip_id, employee_name, office, status) VALUES
            (3, 'Asha Rao', 'HQ', 'ACTIVE'),
            (3, 'Ben Ortiz', 'HQ', 'ACTIVE'),
            (3, 'Carla Mendes', 'Riverside', 'ACTIVE'),
            (3, 'Dev Patel', 'HQ', 'ACTIVE'),
            (3, 'Elena Petrova', 'HQ', 'ACTIVE'),
            (3, 'Farid Khan', 'Riverside', 'ACTIVE'),
            (3, 'Grace Liu', 'HQ', 'ACTIVE'),
            (3, 'Hana Kim', 'HQ', 'ACTIVE'),
            (2, 'Ivan Novak', 'HQ', 'ACTIVE'),
            (2, 'Jonas Weber', 'Riverside', 'CANCELLED')",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{BookingRepository, TripRepository};
    use crate::db::Database;

    #[tokio::test]
    async fn test_seed_is_idempotent_and_matches_fixtures() {
        let db = Database::with_max_connections("sqlite::memory:", 1)
            .await
            .unwrap();
        db.run_migrations().await.unwrap();
        let pool = db.pool();

        seed_demo_data(&pool).await.unwrap();
        seed_demo_data(&pool).await.unwrap();

        let trip = TripRepository::find_by_label(&pool, "Path-3 - 07:30")
            .await
            .unwrap();
        assert_eq!(trip.len(), 1);
        assert_eq!(
            BookingRepository::active_count(&pool, trip[0].id).await.unwrap(),
            8
        );
    }
}
