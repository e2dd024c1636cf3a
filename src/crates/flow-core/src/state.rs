//! State contract between the runtime and the caller's flow record
//!
//! The runtime is generic over the state type. Instead of prescribing a
//! shape, it asks the state to implement [`FlowControl`]: a two-method
//! contract covering the only pieces of state the runtime itself touches,
//! the `next_node` override and failure capture.

use crate::graph::NodeId;

/// A failure observed by the runtime while driving the graph
///
/// Delivered to the state via [`FlowControl::record_failure`] so the
/// application can translate it into its own error taxonomy.
#[derive(Debug, Clone)]
pub enum FlowFailure {
    /// A node function returned an error
    Node {
        /// Node that failed
        node: NodeId,
        /// Error message from the node
        message: String,
    },

    /// The run exceeded the iteration budget
    ///
    /// A fatal misconfiguration: some cycle in the graph never reached the
    /// terminal node.
    CycleBudget {
        /// Number of iterations performed before giving up
        iterations: usize,
    },

    /// No outgoing edge matched after a node ran
    Stuck {
        /// Node with no matching edge
        node: NodeId,
    },
}

/// Contract the state type must fulfil for the runtime
///
/// `Clone` is required so the runtime can retain the pre-invocation state
/// when a node fails: the clone is what failure capture and recovery
/// routing operate on.
pub trait FlowControl: Clone + Send + 'static {
    /// Consume the `next_node` override, if a node set one
    ///
    /// Called once after every node invocation. Returning `Some` short
    /// circuits conditional edge evaluation for this step.
    fn take_next_node(&mut self) -> Option<NodeId>;

    /// Record a runtime-observed failure on the state
    ///
    /// Implementations must not panic; the runtime relies on this to keep
    /// every failure inside the flow record.
    fn record_failure(&mut self, failure: FlowFailure);
}
