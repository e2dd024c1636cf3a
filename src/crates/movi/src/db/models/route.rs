//! Route model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A service route: a path plus shift time and direction
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    /// Row id
    pub id: i64,

    /// Route name (column is `route_name`)
    pub route_name: String,

    /// Path the route follows
    pub path_id: Option<i64>,

    /// Shift time (`HH:MM`)
    pub shift_time: Option<String>,

    /// Direction: up (to office) or down (from office)
    pub direction: Option<String>,
}
