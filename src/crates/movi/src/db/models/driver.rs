//! Driver model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A shuttle driver
///
/// `status` is nullable at the model level because older deployments lack
/// the column; the repository projects NULL in that case.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    /// Row id
    pub id: i64,

    /// Full name
    pub name: String,

    /// Shift start (`HH:MM`)
    pub shift_start: String,

    /// Shift end (`HH:MM`)
    pub shift_end: String,

    /// Availability status: active, unavailable
    pub status: Option<String>,
}

impl Driver {
    /// Whether the driver is available for assignment
    pub fn is_available(&self) -> bool {
        self.status.as_deref().map(|s| s == "active").unwrap_or(true)
    }
}
