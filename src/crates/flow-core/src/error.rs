//! Error types for graph construction and execution
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.
//! Structural errors (unknown nodes, bad wiring) surface as `Err` from
//! [`Graph::run`](crate::Graph::run); everything that happens *inside* a
//! node is captured on the state through
//! [`FlowControl::record_failure`](crate::FlowControl::record_failure) and
//! never escapes the runtime.

use thiserror::Error;

/// Convenience result type using [`FlowError`]
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised by the graph runtime
#[derive(Error, Debug)]
pub enum FlowError {
    /// Graph structure validation failed
    ///
    /// Occurs before execution when the wiring is inconsistent: an edge
    /// references a node that was never registered, or the entry/terminal
    /// node is missing.
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A node was routed to that does not exist
    ///
    /// Indicates a `next_node` override or conditional edge target naming
    /// an unregistered node. This is a programming error, not a runtime
    /// condition.
    #[error("Unknown node '{0}'")]
    MissingNode(String),

    /// Node execution failed with context
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution {
        /// Name of the node that failed
        node: String,
        /// Error message from node execution
        error: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom application-defined error
    #[error("{0}")]
    Custom(String),
}

impl FlowError {
    /// Create a node execution error with context
    pub fn node_execution(node: impl Into<String>, error: impl Into<String>) -> Self {
        Self::NodeExecution {
            node: node.into(),
            error: error.into(),
        }
    }
}
