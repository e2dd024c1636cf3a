//! Path model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An ordered sequence of stops
///
/// Named `TransitPath` to avoid clashing with `std::path`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransitPath {
    /// Row id
    pub id: i64,

    /// Path name (column is `path_name`)
    pub path_name: String,
}
