//! Core graph data structures
//!
//! A graph consists of named nodes (async functions of the state), edges
//! (unconditional or predicate-guarded transitions), an entry node and a
//! terminal node. Construction is imperative: register nodes, wire edges,
//! then call [`Graph::validate`] or let [`Graph::run`](crate::Graph::run)
//! validate on first use.
//!
//! ```text
//!  START ──► parse ──► resolve ──► check ──┬──► execute ──► report ──► END
//!                                          └──► report (needs input)
//! ```
//!
//! Edges out of a node are evaluated in declared order; the first
//! conditional edge whose predicate is true wins, and a direct edge always
//! matches when reached. A node may bypass edge evaluation entirely by
//! setting the state's `next_node` override.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::state::FlowControl;

/// Node identifier - unique name for each node in the graph
pub type NodeId = String;

/// Special node identifier for graph entry
pub const START: &str = "__start__";

/// Special node identifier for graph termination
pub const END: &str = "__end__";

/// Boxed future returned by node functions
pub type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<S>> + Send>>;

/// Node executor: an async function of the state
pub type NodeFn<S> = Arc<dyn Fn(S) -> NodeFuture<S> + Send + Sync>;

/// Predicate guarding a conditional edge; pure function of state
pub type EdgePredicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Edge type defining transitions between nodes
pub enum Edge<S> {
    /// Unconditional edge to a specific node
    Direct(NodeId),

    /// Conditional edge taken when its predicate holds
    Conditional {
        /// Human-readable label used in validation errors and tracing
        label: String,
        /// Pure predicate over the state
        predicate: EdgePredicate<S>,
        /// Target node when the predicate is true
        target: NodeId,
    },
}

impl<S> Edge<S> {
    /// Target node of this edge
    pub fn target(&self) -> &NodeId {
        match self {
            Edge::Direct(target) => target,
            Edge::Conditional { target, .. } => target,
        }
    }
}

impl<S> std::fmt::Debug for Edge<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional { label, target, .. } => f
                .debug_struct("Conditional")
                .field("label", label)
                .field("predicate", &"<function>")
                .field("target", target)
                .finish(),
        }
    }
}

/// A registered graph of nodes and edges
///
/// Generic over the state type `S`, which must implement
/// [`FlowControl`](crate::FlowControl) for the runtime to drive it.
pub struct Graph<S> {
    pub(crate) nodes: HashMap<NodeId, NodeFn<S>>,
    pub(crate) edges: HashMap<NodeId, Vec<Edge<S>>>,
    pub(crate) entry: NodeId,
    pub(crate) terminal: NodeId,
    pub(crate) recovery: Option<NodeId>,
}

impl<S: FlowControl> Graph<S> {
    /// Create a new graph with the given entry and terminal nodes
    ///
    /// # Arguments
    /// * `entry` - Node where every run begins
    /// * `terminal` - Node that must run exactly once before the run ends
    pub fn new(entry: impl Into<NodeId>, terminal: impl Into<NodeId>) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: entry.into(),
            terminal: terminal.into(),
            recovery: None,
        }
    }

    /// Register a node function under a name
    ///
    /// Later registrations replace earlier ones with the same name.
    pub fn add_node<F>(&mut self, name: impl Into<NodeId>, executor: F) -> &mut Self
    where
        F: Fn(S) -> NodeFuture<S> + Send + Sync + 'static,
    {
        self.nodes.insert(name.into(), Arc::new(executor));
        self
    }

    /// Add an unconditional edge between two nodes
    pub fn add_edge(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>) -> &mut Self {
        self.edges
            .entry(source.into())
            .or_default()
            .push(Edge::Direct(target.into()));
        self
    }

    /// Add a conditional edge guarded by a predicate
    ///
    /// Edges are evaluated in the order they were added; the first matching
    /// edge wins.
    pub fn add_conditional_edge<P>(
        &mut self,
        source: impl Into<NodeId>,
        label: impl Into<String>,
        predicate: P,
        target: impl Into<NodeId>,
    ) -> &mut Self
    where
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.edges.entry(source.into()).or_default().push(Edge::Conditional {
            label: label.into(),
            predicate: Arc::new(predicate),
            target: target.into(),
        });
        self
    }

    /// Set the recovery node routed to when a node function fails
    ///
    /// Without a recovery node, failures route straight to the terminal
    /// node.
    pub fn set_recovery(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.recovery = Some(node.into());
        self
    }

    /// Entry node name
    pub fn entry(&self) -> &NodeId {
        &self.entry
    }

    /// Terminal node name
    pub fn terminal(&self) -> &NodeId {
        &self.terminal
    }

    /// Number of registered nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validate the graph structure
    ///
    /// Checks that the entry, terminal and recovery nodes are registered
    /// and that every edge references registered nodes (or [`END`]).
    pub fn validate(&self) -> Result<()> {
        if !self.nodes.contains_key(&self.entry) {
            return Err(FlowError::Validation(format!(
                "entry node '{}' is not registered",
                self.entry
            )));
        }
        if !self.nodes.contains_key(&self.terminal) {
            return Err(FlowError::Validation(format!(
                "terminal node '{}' is not registered",
                self.terminal
            )));
        }
        if let Some(recovery) = &self.recovery {
            if !self.nodes.contains_key(recovery) {
                return Err(FlowError::Validation(format!(
                    "recovery node '{}' is not registered",
                    recovery
                )));
            }
        }
        for (source, edges) in &self.edges {
            if !self.nodes.contains_key(source) {
                return Err(FlowError::Validation(format!(
                    "edge source '{}' is not registered",
                    source
                )));
            }
            for edge in edges {
                let target = edge.target();
                if target != END && !self.nodes.contains_key(target) {
                    return Err(FlowError::Validation(format!(
                        "edge '{}' -> '{}' targets an unregistered node",
                        source, target
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FlowFailure;

    #[derive(Clone, Default)]
    struct TestState {
        next: Option<NodeId>,
    }

    impl FlowControl for TestState {
        fn take_next_node(&mut self) -> Option<NodeId> {
            self.next.take()
        }
        fn record_failure(&mut self, _failure: FlowFailure) {}
    }

    fn noop(state: TestState) -> NodeFuture<TestState> {
        Box::pin(async move { Ok(state) })
    }

    #[test]
    fn test_validate_rejects_missing_entry() {
        let graph: Graph<TestState> = Graph::new("missing", "also_missing");
        assert!(matches!(graph.validate(), Err(FlowError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_dangling_edge_target() {
        let mut graph: Graph<TestState> = Graph::new("a", "a");
        graph.add_node("a", noop);
        graph.add_edge("a", "ghost");
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_end_target() {
        let mut graph: Graph<TestState> = Graph::new("a", "a");
        graph.add_node("a", noop);
        graph.add_edge("a", END);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_edge_ordering_is_preserved() {
        let mut graph: Graph<TestState> = Graph::new("a", "b");
        graph.add_node("a", noop);
        graph.add_node("b", noop);
        graph.add_conditional_edge("a", "first", |_| false, "b");
        graph.add_edge("a", "b");
        let edges = graph.edges.get("a").unwrap();
        assert!(matches!(edges[0], Edge::Conditional { .. }));
        assert!(matches!(edges[1], Edge::Direct(_)));
    }
}
