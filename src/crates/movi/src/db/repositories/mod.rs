//! Repositories for fleet database operations
//!
//! One repository per aggregate, in the same shape throughout: a unit
//! struct with static async methods taking the pool.

mod audit_repo;
mod booking_repo;
mod deployment_repo;
mod driver_repo;
mod network_repo;
mod trip_repo;
mod vehicle_repo;

pub use audit_repo::AuditRepository;
pub use booking_repo::{BookingRepository, OfficeDemand, OverbookedTrip};
pub use deployment_repo::DeploymentRepository;
pub use driver_repo::DriverRepository;
pub use network_repo::NetworkRepository;
pub use trip_repo::TripRepository;
pub use vehicle_repo::{VehicleRepository, VehicleUsage};

/// Today's service date (`YYYY-MM-DD`)
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
