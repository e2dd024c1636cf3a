//! Agent error taxonomy
//!
//! Every user-visible failure carries a stable machine-readable
//! [`ErrorKind`] next to its human-readable message. Node-local errors are
//! captured on the flow state and routed through the fallback or report
//! nodes; nothing above a node is allowed to throw uncaught.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable error kinds surfaced in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Parser cannot classify the input
    UnknownAction,
    /// Input contains the literal token `undefined` (broken UI payload)
    InvalidSelection,
    /// Required parameter key absent
    MissingParameters,
    /// Parameter present but of the wrong type
    InvalidParameters,
    /// Resolver miss on a trip target
    TripNotFound,
    /// Resolver miss on a route target
    RouteNotFound,
    /// Resolver miss on a stop target
    StopNotFound,
    /// Resolver miss on a path target
    PathNotFound,
    /// Resolver miss on a vehicle target
    VehicleNotFound,
    /// Resolver miss on a driver target
    DriverNotFound,
    /// Multiple equally-plausible matches
    AmbiguousTarget,
    /// Page gating failed
    ContextMismatch,
    /// Assignment to a trip with an existing deployment
    AlreadyDeployed,
    /// Vehicle availability window violation
    VehicleConflict,
    /// Driver availability window violation
    DriverConflict,
    /// Confirm arrived after the session expired
    SessionExpired,
    /// Confirm arrived for a session no longer PENDING
    SessionNotPending,
    /// Graph iteration cap exceeded
    GraphCycle,
    /// All model retries exhausted
    LlmTimeout,
    /// Tool-level SQL failure
    DatabaseError,
    /// Anything that should never happen
    Internal,
}

impl ErrorKind {
    /// Stable snake_case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownAction => "unknown_action",
            ErrorKind::InvalidSelection => "invalid_selection",
            ErrorKind::MissingParameters => "missing_parameters",
            ErrorKind::InvalidParameters => "invalid_parameters",
            ErrorKind::TripNotFound => "trip_not_found",
            ErrorKind::RouteNotFound => "route_not_found",
            ErrorKind::StopNotFound => "stop_not_found",
            ErrorKind::PathNotFound => "path_not_found",
            ErrorKind::VehicleNotFound => "vehicle_not_found",
            ErrorKind::DriverNotFound => "driver_not_found",
            ErrorKind::AmbiguousTarget => "ambiguous_target",
            ErrorKind::ContextMismatch => "context_mismatch",
            ErrorKind::AlreadyDeployed => "already_deployed",
            ErrorKind::VehicleConflict => "vehicle_conflict",
            ErrorKind::DriverConflict => "driver_conflict",
            ErrorKind::SessionExpired => "session_expired",
            ErrorKind::SessionNotPending => "session_not_pending",
            ErrorKind::GraphCycle => "graph_cycle",
            ErrorKind::LlmTimeout => "llm_timeout",
            ErrorKind::DatabaseError => "database_error",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind plus user-facing message, as carried on the flow state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Machine-readable kind
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
}

impl ErrorInfo {
    /// Create an error record
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors raised by tools and services
#[derive(Error, Debug)]
pub enum AgentError {
    /// Domain failure with a stable kind
    #[error("{kind}: {message}")]
    Domain {
        /// Machine-readable kind
        kind: ErrorKind,
        /// Human-readable message
        message: String,
    },

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(#[from] flow_session::SessionError),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create a domain error
    pub fn domain(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Domain {
            kind,
            message: message.into(),
        }
    }

    /// Machine-readable kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Domain { kind, .. } => *kind,
            AgentError::Database(_) => ErrorKind::DatabaseError,
            AgentError::Session(flow_session::SessionError::Conflict { .. }) => {
                ErrorKind::SessionNotPending
            }
            AgentError::Session(_) => ErrorKind::Internal,
            AgentError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show a user
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Domain { message, .. } => message.clone(),
            AgentError::Database(_) => {
                "Something went wrong talking to the database. Please retry.".to_string()
            }
            AgentError::Session(_) => {
                "That confirmation is no longer available. Please re-issue the command.".to_string()
            }
            AgentError::Serialization(_) => "Internal error. Please retry.".to_string(),
        }
    }

    /// Error info record for the flow state
    pub fn info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind(), self.user_message())
    }
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names_are_snake_case() {
        assert_eq!(ErrorKind::VehicleConflict.as_str(), "vehicle_conflict");
        assert_eq!(ErrorKind::ContextMismatch.as_str(), "context_mismatch");
        assert_eq!(ErrorKind::SessionNotPending.as_str(), "session_not_pending");
    }

    #[test]
    fn test_domain_error_keeps_kind_and_message() {
        let err = AgentError::domain(ErrorKind::TripNotFound, "no trip named 'Bulk'");
        assert_eq!(err.kind(), ErrorKind::TripNotFound);
        assert_eq!(err.user_message(), "no trip named 'Bulk'");
    }

    #[test]
    fn test_database_error_message_is_generic() {
        let err = AgentError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::DatabaseError);
        assert!(err.user_message().contains("retry"));
    }
}
