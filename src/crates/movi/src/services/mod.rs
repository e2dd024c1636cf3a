//! Services: the two externally-visible entry points
//!
//! `AgentService` runs the graph end-to-end for a message;
//! `ConfirmationService` applies or cancels a previously parked action.

pub mod agent;
pub mod confirmation;

pub use agent::{AgentService, IncomingMessage, MessageOutcome};
pub use confirmation::ConfirmationService;
