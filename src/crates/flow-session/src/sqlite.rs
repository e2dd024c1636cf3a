//! SQLite-backed session storage
//!
//! Production implementation of [`SessionStore`] on sqlx/SQLite. Status
//! transitions are compare-and-set at the SQL level: the UPDATE carries
//! `AND status = ?`, so of two concurrent callers exactly one sees a row
//! affected. Timestamps are stored as fixed-width ISO-8601 TEXT so that
//! lexicographic comparison in SQL matches chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::session::{Session, SessionKind, SessionStatus};
use crate::store::SessionStore;

/// Format a timestamp as fixed-width ISO-8601 (UTC, microseconds)
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SessionError::Storage(format!("bad timestamp '{}': {}", value, e)))
}

/// Raw row shape; all columns are TEXT or INTEGER due to SQLite typing
#[derive(Debug, FromRow)]
struct SessionRow {
    session_id: String,
    user_id: i64,
    kind: String,
    payload: String,
    conversation_history: String,
    status: String,
    created_at: String,
    updated_at: String,
    expires_at: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        Ok(Session {
            session_id: Uuid::parse_str(&self.session_id)
                .map_err(|e| SessionError::Storage(format!("bad session id: {}", e)))?,
            user_id: self.user_id,
            kind: SessionKind::parse(&self.kind)
                .ok_or_else(|| SessionError::Storage(format!("bad kind '{}'", self.kind)))?,
            payload: serde_json::from_str(&self.payload)?,
            conversation_history: serde_json::from_str(&self.conversation_history)?,
            status: SessionStatus::parse(&self.status)
                .ok_or_else(|| SessionError::Storage(format!("bad status '{}'", self.status)))?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            expires_at: parse_ts(&self.expires_at)?,
        })
    }
}

/// SQLite session store
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Wrap an existing connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the backing table when it does not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS agent_sessions (
                session_id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                conversation_history TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'PENDING',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_agent_sessions_user_status
             ON agent_sessions (user_id, kind, status)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, session_id: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM agent_sessions WHERE session_id = ?",
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SessionRow::into_session).transpose()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, session: Session) -> Result<Session> {
        sqlx::query(
            "INSERT INTO agent_sessions
                (session_id, user_id, kind, payload, conversation_history,
                 status, created_at, updated_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.session_id.to_string())
        .bind(session.user_id)
        .bind(session.kind.as_str())
        .bind(serde_json::to_string(&session.payload)?)
        .bind(serde_json::to_string(&session.conversation_history)?)
        .bind(session.status.as_str())
        .bind(fmt_ts(session.created_at))
        .bind(fmt_ts(session.updated_at))
        .bind(fmt_ts(session.expires_at))
        .execute(&self.pool)
        .await?;
        Ok(session)
    }

    async fn get(&self, session_id: Uuid) -> Result<Option<Session>> {
        self.fetch(session_id).await
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

        let result = sqlx::query(
            "UPDATE agent_sessions SET status = ?, updated_at = ?
             WHERE session_id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(fmt_ts(Utc::now()))
        .bind(session_id.to_string())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.fetch(session_id).await? {
                None => Err(SessionError::NotFound(session_id)),
                Some(actual) => Err(SessionError::Conflict {
                    session_id,
                    expected,
                    actual: actual.status,
                }),
            };
        }

        self.fetch(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))
    }

    async fn update_payload(
        &self,
        session_id: Uuid,
        payload: serde_json::Value,
        conversation_history: serde_json::Value,
    ) -> Result<Session> {
        let result = sqlx::query(
            "UPDATE agent_sessions
             SET payload = ?, conversation_history = ?, updated_at = ?
             WHERE session_id = ? AND status = 'PENDING'",
        )
        .bind(serde_json::to_string(&payload)?)
        .bind(serde_json::to_string(&conversation_history)?)
        .bind(fmt_ts(Utc::now()))
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.fetch(session_id).await? {
                None => Err(SessionError::NotFound(session_id)),
                Some(actual) => Err(SessionError::Conflict {
                    session_id,
                    expected: SessionStatus::Pending,
                    actual: actual.status,
                }),
            };
        }

        self.fetch(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))
    }

    async fn find_active_wizard(&self, user_id: i64) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM agent_sessions
             WHERE user_id = ? AND kind = 'wizard' AND status = 'PENDING'
               AND expires_at > ?
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(fmt_ts(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;
        row.map(SessionRow::into_session).transpose()
    }

    async fn expire_overdue(&self) -> Result<u64> {
        let now = fmt_ts(Utc::now());
        let result = sqlx::query(
            "UPDATE agent_sessions SET status = 'EXPIRED', updated_at = ?
             WHERE status = 'PENDING' AND expires_at <= ?",
        )
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteSessionStore {
        // One connection: every handle sees the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteSessionStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn pending(user_id: i64) -> Session {
        Session::new(
            user_id,
            SessionKind::PendingConfirmation,
            json!({"action": "cancel_trip", "parameters": {}}),
        )
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = store().await;
        let session = store.create(pending(1)).await.unwrap();
        let loaded = store.get(session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded.session_id, session.session_id);
        assert_eq!(loaded.kind, SessionKind::PendingConfirmation);
        assert_eq!(loaded.payload["action"], "cancel_trip");
        assert_eq!(loaded.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn test_cas_second_caller_conflicts() {
        let store = store().await;
        let session = store.create(pending(1)).await.unwrap();
        let id = session.session_id;

        store
            .transition(id, SessionStatus::Pending, SessionStatus::Confirmed)
            .await
            .unwrap();
        let err = store
            .transition(id, SessionStatus::Pending, SessionStatus::Cancelled)
            .await
            .unwrap_err();
        match err {
            SessionError::Conflict { actual, .. } => {
                assert_eq!(actual, SessionStatus::Confirmed)
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_confirmed_to_done() {
        let store = store().await;
        let session = store.create(pending(1)).await.unwrap();
        let id = session.session_id;
        store
            .transition(id, SessionStatus::Pending, SessionStatus::Confirmed)
            .await
            .unwrap();
        let done = store
            .transition(id, SessionStatus::Confirmed, SessionStatus::Done)
            .await
            .unwrap();
        assert_eq!(done.status, SessionStatus::Done);
    }

    #[tokio::test]
    async fn test_transition_missing_session() {
        let store = store().await;
        let err = store
            .transition(
                Uuid::new_v4(),
                SessionStatus::Pending,
                SessionStatus::Confirmed,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_wizard_payload_progress() {
        let store = store().await;
        let session = store
            .create(Session::new(
                3,
                SessionKind::Wizard,
                json!({"flow": "trip_creation", "current_step": 0}),
            ))
            .await
            .unwrap();

        store
            .update_payload(
                session.session_id,
                json!({"flow": "trip_creation", "current_step": 1}),
                json!([{"role": "user", "content": "Shuttle A"}]),
            )
            .await
            .unwrap();

        let active = store.find_active_wizard(3).await.unwrap().unwrap();
        assert_eq!(active.payload["current_step"], 1);
    }

    #[tokio::test]
    async fn test_expire_overdue_only_touches_pending() {
        let store = store().await;
        let stale = pending(1).with_expires_at(Utc::now() - Duration::minutes(5));
        let stale_id = stale.session_id;
        store.create(stale).await.unwrap();

        let confirmed = pending(1).with_expires_at(Utc::now() - Duration::minutes(5));
        let confirmed_id = confirmed.session_id;
        store.create(confirmed).await.unwrap();
        store
            .transition(confirmed_id, SessionStatus::Pending, SessionStatus::Confirmed)
            .await
            .unwrap();

        let count = store.expire_overdue().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            store.get(stale_id).await.unwrap().unwrap().status,
            SessionStatus::Expired
        );
        assert_eq!(
            store.get(confirmed_id).await.unwrap().unwrap().status,
            SessionStatus::Confirmed
        );
    }
}
