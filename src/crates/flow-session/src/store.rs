//! Session storage trait
//!
//! The core abstraction for persisting sessions. Backends must make
//! [`SessionStore::transition`] atomic with respect to concurrent callers:
//! for one session, exactly one caller observes the expected status and
//! wins; every other caller receives [`SessionError::Conflict`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::session::{Session, SessionStatus};

/// Storage backend for durable sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session
    async fn create(&self, session: Session) -> Result<Session>;

    /// Fetch a session by id
    async fn get(&self, session_id: Uuid) -> Result<Option<Session>>;

    /// Compare-and-set status transition
    ///
    /// Atomically moves the session from `expected` to `to`. Fails with
    /// [`SessionError::InvalidTransition`](crate::SessionError::InvalidTransition)
    /// when the transition is illegal, and with
    /// [`SessionError::Conflict`](crate::SessionError::Conflict) when
    /// another caller already moved the session out of `expected`.
    async fn transition(
        &self,
        session_id: Uuid,
        expected: SessionStatus,
        to: SessionStatus,
    ) -> Result<Session>;

    /// Replace the payload and conversation history of a PENDING session
    ///
    /// Used by wizards to persist step progress between turns. Sessions in
    /// any other status reject the update with `Conflict`.
    async fn update_payload(
        &self,
        session_id: Uuid,
        payload: serde_json::Value,
        conversation_history: serde_json::Value,
    ) -> Result<Session>;

    /// Most recent PENDING, unexpired wizard session for a user
    async fn find_active_wizard(&self, user_id: i64) -> Result<Option<Session>>;

    /// Mark every overdue PENDING session EXPIRED
    ///
    /// Returns the number of sessions expired. Driven out-of-band by the
    /// reaper task.
    async fn expire_overdue(&self) -> Result<u64>;
}
