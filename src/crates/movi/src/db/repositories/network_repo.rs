//! Network configuration repository: stops, paths and routes
//!
//! Column names are deliberate and verified at boot: stops use `name`,
//! paths use `path_name`, routes use `route_name`.

use crate::db::models::{Route, Stop, TransitPath};
use crate::db::DatabasePool;

/// Stops/paths/routes repository
pub struct NetworkRepository;

impl NetworkRepository {
    // ------------------------------------------------------------------
    // Stops
    // ------------------------------------------------------------------

    /// All stops
    pub async fn list_stops(pool: &DatabasePool) -> Result<Vec<Stop>, sqlx::Error> {
        sqlx::query_as::<_, Stop>("SELECT id, name, latitude, longitude FROM stops ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Get a stop by id
    pub async fn get_stop(pool: &DatabasePool, id: i64) -> Result<Option<Stop>, sqlx::Error> {
        sqlx::query_as::<_, Stop>("SELECT id, name, latitude, longitude FROM stops WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Stops matching a name
    ///
    /// Exact case-insensitive match first, then first-token match
    /// ("Odeon" matches "Odeon Circle").
    pub async fn find_stops_by_name(
        pool: &DatabasePool,
        name: &str,
    ) -> Result<Vec<Stop>, sqlx::Error> {
        let exact = sqlx::query_as::<_, Stop>(
            "SELECT id, name, latitude, longitude FROM stops
             WHERE name = ? COLLATE NOCASE ORDER BY name",
        )
        .bind(name)
        .fetch_all(pool)
        .await?;
        if !exact.is_empty() {
            return Ok(exact);
        }
        sqlx::query_as::<_, Stop>(
            "SELECT id, name, latitude, longitude FROM stops
             WHERE name LIKE ? COLLATE NOCASE ORDER BY name",
        )
        .bind(format!("{}%", name.trim()))
        .fetch_all(pool)
        .await
    }

    /// Create a stop
    pub async fn create_stop(
        pool: &DatabasePool,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Stop, sqlx::Error> {
        sqlx::query_as::<_, Stop>(
            "INSERT INTO stops (name, latitude, longitude)
             VALUES (?, ?, ?)
             RETURNING id, name, latitude, longitude",
        )
        .bind(name)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(pool)
        .await
    }

    /// Rename a stop
    pub async fn rename_stop(
        pool: &DatabasePool,
        id: i64,
        new_name: &str,
    ) -> Result<Option<Stop>, sqlx::Error> {
        sqlx::query_as::<_, Stop>(
            "UPDATE stops SET name = ? WHERE id = ?
             RETURNING id, name, latitude, longitude",
        )
        .bind(new_name)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Delete a stop
    pub async fn delete_stop(pool: &DatabasePool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stops WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Number of paths using a stop
    pub async fn paths_using_stop(pool: &DatabasePool, stop_id: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT path_id) FROM path_stops WHERE stop_id = ?")
                .bind(stop_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    /// All paths
    pub async fn list_paths(pool: &DatabasePool) -> Result<Vec<TransitPath>, sqlx::Error> {
        sqlx::query_as::<_, TransitPath>(
            "SELECT id, path_name FROM paths ORDER BY path_name",
        )
        .fetch_all(pool)
        .await
    }

    /// Get a path by id
    pub async fn get_path(
        pool: &DatabasePool,
        id: i64,
    ) -> Result<Option<TransitPath>, sqlx::Error> {
        sqlx::query_as::<_, TransitPath>("SELECT id, path_name FROM paths WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Paths matching a name, case-insensitive
    pub async fn find_paths_by_name(
        pool: &DatabasePool,
        name: &str,
    ) -> Result<Vec<TransitPath>, sqlx::Error> {
        sqlx::query_as::<_, TransitPath>(
            "SELECT id, path_name FROM paths WHERE path_name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_all(pool)
        .await
    }

    /// Create a path with its ordered stops
    pub async fn create_path(
        pool: &DatabasePool,
        name: &str,
        stop_ids: &[i64],
    ) -> Result<TransitPath, sqlx::Error> {
        let path = sqlx::query_as::<_, TransitPath>(
            "INSERT INTO paths (path_name) VALUES (?) RETURNING id, path_name",
        )
        .bind(name)
        .fetch_one(pool)
        .await?;
        Self::set_path_stops(pool, path.id, stop_ids).await?;
        Ok(path)
    }

    /// Replace a path's ordered stops
    pub async fn set_path_stops(
        pool: &DatabasePool,
        path_id: i64,
        stop_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM path_stops WHERE path_id = ?")
            .bind(path_id)
            .execute(pool)
            .await?;
        for (seq, stop_id) in stop_ids.iter().enumerate() {
            sqlx::query("INSERT INTO path_stops (path_id, stop_id, seq) VALUES (?, ?, ?)")
                .bind(path_id)
                .bind(stop_id)
                .bind(seq as i64)
                .execute(pool)
                .await?;
        }
        Ok(())
    }

    /// Ordered stops of a path
    pub async fn stops_for_path(
        pool: &DatabasePool,
        path_id: i64,
    ) -> Result<Vec<Stop>, sqlx::Error> {
        sqlx::query_as::<_, Stop>(
            "SELECT s.id, s.name, s.latitude, s.longitude
             FROM path_stops ps
             JOIN stops s ON s.id = ps.stop_id
             WHERE ps.path_id = ?
             ORDER BY ps.seq",
        )
        .bind(path_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a path and its stop links
    pub async fn delete_path(pool: &DatabasePool, id: i64) -> Result<u64, sqlx::Error> {
        sqlx::query("DELETE FROM path_stops WHERE path_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        let result = sqlx::query("DELETE FROM paths WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Routes built on a path
    pub async fn routes_using_path(
        pool: &DatabasePool,
        path_id: i64,
    ) -> Result<Vec<Route>, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            "SELECT id, route_name, path_id, shift_time, direction FROM routes
             WHERE path_id = ? ORDER BY route_name",
        )
        .bind(path_id)
        .fetch_all(pool)
        .await
    }

    // ------------------------------------------------------------------
    // Routes
    // ------------------------------------------------------------------

    /// All routes
    pub async fn list_routes(pool: &DatabasePool) -> Result<Vec<Route>, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            "SELECT id, route_name, path_id, shift_time, direction FROM routes
             ORDER BY route_name",
        )
        .fetch_all(pool)
        .await
    }

    /// Get a route by id
    pub async fn get_route(pool: &DatabasePool, id: i64) -> Result<Option<Route>, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            "SELECT id, route_name, path_id, shift_time, direction FROM routes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Routes matching a name, case-insensitive
    pub async fn find_routes_by_name(
        pool: &DatabasePool,
        name: &str,
    ) -> Result<Vec<Route>, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            "SELECT id, route_name, path_id, shift_time, direction FROM routes
             WHERE route_name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_all(pool)
        .await
    }

    /// Create a route
    pub async fn create_route(
        pool: &DatabasePool,
        name: &str,
        path_id: i64,
        shift_time: &str,
        direction: &str,
    ) -> Result<Route, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            "INSERT INTO routes (route_name, path_id, shift_time, direction)
             VALUES (?, ?, ?, ?)
             RETURNING id, route_name, path_id, shift_time, direction",
        )
        .bind(name)
        .bind(path_id)
        .bind(shift_time)
        .bind(direction)
        .fetch_one(pool)
        .await
    }

    /// Clone a route
    pub async fn duplicate_route(pool: &DatabasePool, id: i64) -> Result<Route, sqlx::Error> {
        sqlx::query_as::<_, Route>(
            "INSERT INTO routes (route_name, path_id, shift_time, direction)
             SELECT route_name || ' (copy)', path_id, shift_time, direction
             FROM routes WHERE id = ?
             RETURNING id, route_name, path_id, shift_time, direction",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Delete a route
    pub async fn delete_route(pool: &DatabasePool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM routes WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
