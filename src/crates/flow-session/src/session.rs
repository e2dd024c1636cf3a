//! Session record and status machine
//!
//! A [`Session`] is one durable row: a pending confirmation snapshot or a
//! wizard's collected progress, owned by one user, with an expiry stamp.
//! All timestamps are `chrono::DateTime<Utc>` and serialise to ISO-8601.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default session time-to-live in seconds: one hour
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Default session time-to-live
pub fn default_ttl() -> Duration {
    Duration::seconds(DEFAULT_TTL_SECS)
}

/// What the session is carrying across turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// A risky action parked until the user confirms
    PendingConfirmation,
    /// A multi-step wizard in progress
    Wizard,
}

impl SessionKind {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::PendingConfirmation => "pending_confirmation",
            SessionKind::Wizard => "wizard",
        }
    }

    /// Parse from the stable wire name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending_confirmation" => Some(SessionKind::PendingConfirmation),
            "wizard" => Some(SessionKind::Wizard),
            _ => None,
        }
    }
}

/// Session lifecycle status
///
/// Legal transitions are `PENDING -> CONFIRMED | CANCELLED | EXPIRED` and
/// `CONFIRMED -> DONE`; everything else is rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Waiting for the user's next turn
    Pending,
    /// User confirmed; execution may proceed
    Confirmed,
    /// User declined or abandoned
    Cancelled,
    /// Terminal: execution finished (successfully or not)
    Done,
    /// Terminal: TTL elapsed before the user returned
    Expired,
}

impl SessionStatus {
    /// Stable wire name (uppercase, as persisted)
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "PENDING",
            SessionStatus::Confirmed => "CONFIRMED",
            SessionStatus::Cancelled => "CANCELLED",
            SessionStatus::Done => "DONE",
            SessionStatus::Expired => "EXPIRED",
        }
    }

    /// Parse from the stable wire name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(SessionStatus::Pending),
            "CONFIRMED" => Some(SessionStatus::Confirmed),
            "CANCELLED" => Some(SessionStatus::Cancelled),
            "DONE" => Some(SessionStatus::Done),
            "EXPIRED" => Some(SessionStatus::Expired),
            _ => None,
        }
    }

    /// Whether moving from `self` to `to` is a legal transition
    pub fn can_transition_to(&self, to: SessionStatus) -> bool {
        matches!(
            (self, to),
            (
                SessionStatus::Pending,
                SessionStatus::Confirmed | SessionStatus::Cancelled | SessionStatus::Expired
            ) | (SessionStatus::Confirmed, SessionStatus::Done)
        )
    }
}

/// One durable session row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Primary key
    pub session_id: Uuid,

    /// Owning user
    pub user_id: i64,

    /// Pending confirmation or wizard
    pub kind: SessionKind,

    /// Kind-specific payload: the pending action snapshot, or the wizard
    /// state record
    pub payload: serde_json::Value,

    /// Conversation turns carried forward across requests
    pub conversation_history: serde_json::Value,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,

    /// Expiry deadline
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new PENDING session with the default 1-hour expiry
    ///
    /// # Arguments
    /// * `user_id` - Owning user
    /// * `kind` - Pending confirmation or wizard
    /// * `payload` - Kind-specific payload
    pub fn new(user_id: i64, kind: SessionKind, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            kind,
            payload,
            conversation_history: serde_json::Value::Array(Vec::new()),
            status: SessionStatus::Pending,
            created_at: now,
            updated_at: now,
            expires_at: now + default_ttl(),
        }
    }

    /// Builder method to attach conversation history
    pub fn with_conversation_history(mut self, history: serde_json::Value) -> Self {
        self.conversation_history = history;
        self
    }

    /// Builder method to override the expiry deadline
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Whether the TTL has elapsed
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legal_transitions() {
        use SessionStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Expired));
        assert!(Confirmed.can_transition_to(Done));
    }

    #[test]
    fn test_illegal_transitions() {
        use SessionStatus::*;
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Done.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Done));
        assert!(!Expired.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new(1, SessionKind::Wizard, json!({"flow": "trip_creation"}));
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(!session.is_expired());
        assert_eq!(session.expires_at - session.created_at, default_ttl());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::Confirmed,
            SessionStatus::Cancelled,
            SessionStatus::Done,
            SessionStatus::Expired,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("bogus"), None);
    }
}
