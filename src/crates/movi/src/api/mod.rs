//! HTTP API: transport-level models, routes and handlers

pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;

pub use routes::{create_router, AppState};
