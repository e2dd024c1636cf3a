//! Trip model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A scheduled shuttle trip
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    /// Row id
    pub id: i64,

    /// Display name shown in the UI; conventionally embeds the route and
    /// time, e.g. "Path-3 - 07:30"
    pub display_name: String,

    /// Route this trip runs on
    pub route_id: Option<i64>,

    /// Service date (`YYYY-MM-DD`)
    pub trip_date: String,

    /// Departure time (`HH:MM`)
    pub scheduled_time: String,

    /// Lifecycle state: SCHEDULED, IN_PROGRESS, COMPLETED, CANCELLED, DELAYED
    pub live_status: String,

    /// Seat capacity
    pub capacity: i64,
}

impl Trip {
    /// Whether the trip is currently running
    pub fn is_in_progress(&self) -> bool {
        self.live_status == "IN_PROGRESS"
    }
}
