//! Database layer: connection pool, schema verification, models and
//! repositories for the fleet domain.

pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod seed;

pub use connection::{Database, DatabasePool};
