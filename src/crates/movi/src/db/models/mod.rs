//! Database models for the fleet domain
//!
//! All timestamp columns are ISO-8601 TEXT due to SQLite type
//! limitations; dates are `YYYY-MM-DD`, times of day `HH:MM`.

mod audit;
mod booking;
mod deployment;
mod driver;
mod path;
mod route;
mod stop;
mod trip;
mod vehicle;

pub use audit::AuditEntry;
pub use booking::Booking;
pub use deployment::Deployment;
pub use driver::Driver;
pub use path::TransitPath;
pub use route::Route;
pub use stop::Stop;
pub use trip::Trip;
pub use vehicle::Vehicle;
