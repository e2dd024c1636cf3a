//! Deployment model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Vehicle/driver assignment for one trip
///
/// One row per trip. `vehicle_id` and `driver_id` are filled in
/// independently; a row with both NULL is an orphan left behind by a
/// removal and is reused by the next assignment rather than re-inserted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deployment {
    /// Row id
    pub id: i64,

    /// Trip this deployment belongs to
    pub trip_id: i64,

    /// Assigned vehicle, if any
    pub vehicle_id: Option<i64>,

    /// Assigned driver, if any
    pub driver_id: Option<i64>,

    /// Creation timestamp (ISO-8601)
    pub created_at: String,

    /// Last update timestamp (ISO-8601)
    pub updated_at: String,
}

impl Deployment {
    /// Whether anything is actually assigned
    pub fn is_populated(&self) -> bool {
        self.vehicle_id.is_some() || self.driver_id.is_some()
    }
}
