//! Vehicle model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A fleet vehicle
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    /// Row id
    pub id: i64,

    /// Registration plate
    pub registration_number: String,

    /// Seat capacity
    pub capacity: i64,

    /// Operational status: active, maintenance, blocked
    pub status: String,
}

impl Vehicle {
    /// Whether the vehicle may be deployed
    pub fn is_deployable(&self) -> bool {
        self.status != "maintenance" && self.status != "blocked"
    }
}
