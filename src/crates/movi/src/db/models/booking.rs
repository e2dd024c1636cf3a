//! Booking model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A passenger booking on a trip
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Row id
    pub id: i64,

    /// Trip booked
    pub trip_id: i64,

    /// Passenger name
    pub employee_name: String,

    /// Passenger's office, used for demand analytics
    pub office: Option<String>,

    /// Booking status: ACTIVE, CANCELLED
    pub status: String,

    /// Creation timestamp (ISO-8601)
    pub created_at: String,
}
