//! flow-session: durable multi-turn session storage
//!
//! A session is what lets a conversational flow survive request
//! boundaries: a pending confirmation waiting for the user's yes/no, or a
//! wizard part-way through collecting its parameters. Sessions live in a
//! keyed store behind the [`SessionStore`] trait, with two backends:
//!
//! - [`InMemorySessionStore`] - `RwLock<HashMap>`, for tests and ephemeral runs
//! - [`SqliteSessionStore`] - sqlx/SQLite, for real deployments
//!
//! Status transitions are compare-and-set: only the caller who observes
//! `PENDING` wins the transition to `CONFIRMED` or `CANCELLED`; the loser
//! receives [`SessionError::Conflict`]. This is what makes concurrent
//! confirm and cancel calls for the same session resolve to exactly one
//! outcome.

pub mod error;
pub mod memory;
pub mod session;
pub mod sqlite;
pub mod store;

pub use error::{Result, SessionError};
pub use memory::InMemorySessionStore;
pub use session::{default_ttl, Session, SessionKind, SessionStatus, DEFAULT_TTL_SECS};
pub use sqlite::SqliteSessionStore;
pub use store::SessionStore;
