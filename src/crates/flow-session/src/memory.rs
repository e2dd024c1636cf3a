//! In-memory session storage for development and testing
//!
//! Reference implementation of [`SessionStore`] backed by
//! `RwLock<HashMap>`. Data is lost on restart; use
//! [`SqliteSessionStore`](crate::SqliteSessionStore) for real deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::session::{Session, SessionKind, SessionStatus};
use crate::store::SessionStore;

/// Thread-safe in-memory session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all sessions (test isolation)
    pub fn clear(&self) {
        self.sessions.write().clear();
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> Result<Session> {
        self.sessions
            .write()
            .insert(session.session_id, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.read().get(&session_id).cloned())
    }

    async fn transition(
        &self,
        session_id: Uuid,
        expected: SessionStatus,
        to: SessionStatus,
    ) -> Result<Session> {
        if !expected.can_transition_to(to) {
            return Err(SessionError::InvalidTransition { from: expected, to });
        }

        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;

        if session.status != expected {
            return Err(SessionError::Conflict {
                session_id,
                expected,
                actual: session.status,
            });
        }

        session.status = to;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn update_payload(
        &self,
        session_id: Uuid,
        payload: serde_json::Value,
        conversation_history: serde_json::Value,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;

        if session.status != SessionStatus::Pending {
            return Err(SessionError::Conflict {
                session_id,
                expected: SessionStatus::Pending,
                actual: session.status,
            });
        }

        session.payload = payload;
        session.conversation_history = conversation_history;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn find_active_wizard(&self, user_id: i64) -> Result<Option<Session>> {
        let now = Utc::now();
        let sessions = self.sessions.read();
        let mut candidates: Vec<&Session> = sessions
            .values()
            .filter(|s| {
                s.user_id == user_id
                    && s.kind == SessionKind::Wizard
                    && s.status == SessionStatus::Pending
                    && s.expires_at > now
            })
            .collect();
        candidates.sort_by_key(|s| s.created_at);
        Ok(candidates.last().map(|s| (*s).clone()))
    }

    async fn expire_overdue(&self) -> Result<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let mut expired = 0u64;
        for session in sessions.values_mut() {
            if session.status == SessionStatus::Pending && session.expires_at <= now {
                session.status = SessionStatus::Expired;
                session.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;

    fn pending(user_id: i64) -> Session {
        Session::new(
            user_id,
            SessionKind::PendingConfirmation,
            json!({"action": "cancel_trip"}),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemorySessionStore::new();
        let session = store.create(pending(1)).await.unwrap();
        let loaded = store.get(session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded.session_id, session.session_id);
        assert_eq!(loaded.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn test_transition_cas_single_winner() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = store.create(pending(1)).await.unwrap();
        let id = session.session_id;

        let confirm = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .transition(id, SessionStatus::Pending, SessionStatus::Confirmed)
                    .await
            })
        };
        let cancel = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .transition(id, SessionStatus::Pending, SessionStatus::Cancelled)
                    .await
            })
        };

        let results = [confirm.await.unwrap(), cancel.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            SessionError::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected() {
        let store = InMemorySessionStore::new();
        let session = store.create(pending(1)).await.unwrap();
        let err = store
            .transition(
                session.session_id,
                SessionStatus::Pending,
                SessionStatus::Done,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_update_payload_requires_pending() {
        let store = InMemorySessionStore::new();
        let session = store
            .create(Session::new(1, SessionKind::Wizard, json!({"step": 0})))
            .await
            .unwrap();

        store
            .update_payload(session.session_id, json!({"step": 1}), json!([]))
            .await
            .unwrap();

        store
            .transition(
                session.session_id,
                SessionStatus::Pending,
                SessionStatus::Cancelled,
            )
            .await
            .unwrap();

        let err = store
            .update_payload(session.session_id, json!({"step": 2}), json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_find_active_wizard_prefers_newest() {
        let store = InMemorySessionStore::new();
        let mut old = Session::new(7, SessionKind::Wizard, json!({"flow": "old"}));
        old.created_at = Utc::now() - Duration::minutes(10);
        store.create(old).await.unwrap();
        store
            .create(Session::new(7, SessionKind::Wizard, json!({"flow": "new"})))
            .await
            .unwrap();

        let found = store.find_active_wizard(7).await.unwrap().unwrap();
        assert_eq!(found.payload["flow"], "new");
        assert!(store.find_active_wizard(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_overdue() {
        let store = InMemorySessionStore::new();
        let overdue = pending(1).with_expires_at(Utc::now() - Duration::minutes(1));
        let overdue_id = overdue.session_id;
        store.create(overdue).await.unwrap();
        store.create(pending(1)).await.unwrap();

        let count = store.expire_overdue().await.unwrap();
        assert_eq!(count, 1);
        let expired = store.get(overdue_id).await.unwrap().unwrap();
        assert_eq!(expired.status, SessionStatus::Expired);
    }
}
