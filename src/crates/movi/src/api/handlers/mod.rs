//! API handler functions

mod confirm;
mod health;
mod message;

pub use confirm::confirm;
pub use health::health;
pub use message::message;
