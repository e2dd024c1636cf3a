//! MOVI: a conversational operations assistant for shuttle-fleet
//! management
//!
//! End users issue natural-language or structured commands; the agent
//! interprets them, validates against live database state, warns about
//! risky consequences, gathers missing parameters through multi-turn
//! wizards, executes mutations and returns structured results for a UI
//! to render.
//!
//! The core is a directed graph of processing stages (see [`nodes`])
//! threading a typed [`state::FlowState`] from intent parsing to result
//! formatting. Durable multi-turn state (pending confirmations, wizard
//! progress) lives in the `flow-session` store; database access goes
//! through [`db`]; the ~60 typed operations live in [`tools`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod intent;
pub mod nodes;
pub mod services;
pub mod state;
pub mod timeutil;
pub mod tools;
pub mod wizard;

pub use config::AppConfig;
pub use context::AgentContext;
pub use error::{AgentError, ErrorKind, Result};
pub use services::{AgentService, ConfirmationService, IncomingMessage};
pub use state::{FinalOutput, FlowState, OutputStatus};
