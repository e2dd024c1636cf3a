//! Stop model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A physical stop on the network
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stop {
    /// Row id
    pub id: i64,

    /// Stop name (column is `name`, not `stop_name`)
    pub name: String,

    /// Latitude
    pub latitude: f64,

    /// Longitude
    pub longitude: f64,
}
