//! Graph execution loop
//!
//! Drives a validated [`Graph`] from its entry node to [`END`], one node at
//! a time. Node failures never escape: the runtime clones the state before
//! each invocation, records failures on the clone and reroutes through the
//! recovery node (once) and the terminal node. The iteration cap bounds
//! every run.

use tracing::{debug, warn};

use crate::error::{FlowError, Result};
use crate::graph::{Edge, Graph, NodeId, END};
use crate::state::{FlowControl, FlowFailure};

/// Upper bound on node invocations per run
///
/// Exceeding the cap is a fatal misconfiguration; the run records a
/// [`FlowFailure::CycleBudget`] and finishes through the terminal node.
pub const MAX_ITERATIONS: usize = 20;

impl<S: FlowControl> Graph<S> {
    /// Execute the graph to completion
    ///
    /// Returns the terminated state. `Err` is reserved for structural
    /// problems (failed validation, routing to an unregistered node);
    /// everything a node does wrong is captured on the state.
    pub async fn run(&self, state: S) -> Result<S> {
        self.validate()?;

        let mut state = state;
        let mut current: NodeId = self.entry.clone();
        let mut iterations = 0usize;
        let mut recovered = false;
        let mut terminal_ran = false;

        loop {
            if current == END {
                break;
            }
            if iterations >= MAX_ITERATIONS {
                warn!(node = %current, iterations, "iteration budget exceeded");
                state.record_failure(FlowFailure::CycleBudget { iterations });
                if terminal_ran {
                    break;
                }
                current = self.terminal.clone();
                // One unconditional pass through the terminal node so the
                // run still produces an output record.
                let executor = self
                    .nodes
                    .get(&current)
                    .ok_or_else(|| FlowError::MissingNode(current.clone()))?;
                if let Ok(next_state) = executor(state.clone()).await {
                    state = next_state;
                }
                break;
            }
            iterations += 1;

            let executor = self
                .nodes
                .get(&current)
                .ok_or_else(|| FlowError::MissingNode(current.clone()))?;

            debug!(node = %current, iteration = iterations, "running node");
            let before = state.clone();
            match executor(state).await {
                Ok(next_state) => {
                    state = next_state;
                    if current == self.terminal {
                        terminal_ran = true;
                    }
                }
                Err(err) => {
                    warn!(node = %current, error = %err, "node failed");
                    state = before;
                    state.record_failure(FlowFailure::Node {
                        node: current.clone(),
                        message: err.to_string(),
                    });
                    // Route through recovery once, then fall back to the
                    // terminal node so the run always produces output.
                    let reroute = match (&self.recovery, recovered) {
                        (Some(recovery), false) if *recovery != current => {
                            recovered = true;
                            recovery.clone()
                        }
                        _ if current != self.terminal => self.terminal.clone(),
                        _ => END.to_string(),
                    };
                    current = reroute;
                    continue;
                }
            }

            // A node-set override takes precedence over edge evaluation.
            if let Some(next) = state.take_next_node() {
                current = next;
                continue;
            }

            match self.select_edge(&current, &state) {
                Some(target) => current = target,
                None => {
                    if current == self.terminal {
                        break;
                    }
                    warn!(node = %current, "no outgoing edge matched");
                    state.record_failure(FlowFailure::Stuck {
                        node: current.clone(),
                    });
                    current = self.terminal.clone();
                }
            }
        }

        Ok(state)
    }

    /// Evaluate the outgoing edges of `node` in declared order
    fn select_edge(&self, node: &NodeId, state: &S) -> Option<NodeId> {
        let edges = self.edges.get(node)?;
        for edge in edges {
            match edge {
                Edge::Direct(target) => return Some(target.clone()),
                Edge::Conditional {
                    label,
                    predicate,
                    target,
                } => {
                    if predicate(state) {
                        debug!(node = %node, edge = %label, target = %target, "conditional edge taken");
                        return Some(target.clone());
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeFuture;

    #[derive(Clone, Default)]
    struct TestState {
        visits: Vec<String>,
        counter: u32,
        next: Option<NodeId>,
        failures: Vec<String>,
        cycle_overflow: bool,
    }

    impl FlowControl for TestState {
        fn take_next_node(&mut self) -> Option<NodeId> {
            self.next.take()
        }
        fn record_failure(&mut self, failure: FlowFailure) {
            match failure {
                FlowFailure::Node { node, .. } => self.failures.push(node),
                FlowFailure::CycleBudget { .. } => self.cycle_overflow = true,
                FlowFailure::Stuck { node } => self.failures.push(format!("stuck:{}", node)),
            }
        }
    }

    fn visiting(name: &'static str) -> impl Fn(TestState) -> NodeFuture<TestState> {
        move |mut state: TestState| -> NodeFuture<TestState> {
            Box::pin(async move {
                state.visits.push(name.to_string());
                Ok(state)
            })
        }
    }

    fn terminal(mut state: TestState) -> NodeFuture<TestState> {
        Box::pin(async move {
            state.visits.push("report".to_string());
            state.next = Some(END.to_string());
            Ok(state)
        })
    }

    #[tokio::test]
    async fn test_linear_run_reaches_terminal() {
        let mut graph: Graph<TestState> = Graph::new("a", "report");
        graph.add_node("a", visiting("a"));
        graph.add_node("b", visiting("b"));
        graph.add_node("report", terminal);
        graph.add_edge("a", "b");
        graph.add_edge("b", "report");

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.visits, vec!["a", "b", "report"]);
    }

    #[tokio::test]
    async fn test_conditional_edges_evaluated_in_order() {
        let mut graph: Graph<TestState> = Graph::new("a", "report");
        graph.add_node("a", visiting("a"));
        graph.add_node("b", visiting("b"));
        graph.add_node("c", visiting("c"));
        graph.add_node("report", terminal);
        // Both predicates are true; the first declared must win.
        graph.add_conditional_edge("a", "to_b", |_| true, "b");
        graph.add_conditional_edge("a", "to_c", |_| true, "c");
        graph.add_edge("b", "report");
        graph.add_edge("c", "report");

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.visits, vec!["a", "b", "report"]);
    }

    #[tokio::test]
    async fn test_next_node_override_beats_edges() {
        let mut graph: Graph<TestState> = Graph::new("a", "report");
        graph.add_node("a", |mut state: TestState| {
            Box::pin(async move {
                state.visits.push("a".to_string());
                state.next = Some("c".to_string());
                Ok(state)
            })
        });
        graph.add_node("b", visiting("b"));
        graph.add_node("c", visiting("c"));
        graph.add_node("report", terminal);
        graph.add_edge("a", "b");
        graph.add_edge("b", "report");
        graph.add_edge("c", "report");

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.visits, vec!["a", "c", "report"]);
    }

    #[tokio::test]
    async fn test_cycle_budget_is_enforced() {
        let mut graph: Graph<TestState> = Graph::new("spin", "report");
        graph.add_node("spin", |mut state: TestState| {
            Box::pin(async move {
                state.counter += 1;
                Ok(state)
            })
        });
        graph.add_node("report", terminal);
        graph.add_conditional_edge("spin", "again", |_| true, "spin");

        let state = graph.run(TestState::default()).await.unwrap();
        assert!(state.cycle_overflow);
        assert!(state.counter <= MAX_ITERATIONS as u32);
        // The terminal node still ran.
        assert_eq!(state.visits, vec!["report"]);
    }

    #[tokio::test]
    async fn test_node_failure_routes_through_recovery() {
        let mut graph: Graph<TestState> = Graph::new("boom", "report");
        graph.add_node("boom", |_state: TestState| {
            Box::pin(async move { Err(FlowError::Custom("kaput".to_string())) })
        });
        graph.add_node("rescue", visiting("rescue"));
        graph.add_node("report", terminal);
        graph.set_recovery("rescue");
        graph.add_edge("rescue", "report");

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.failures, vec!["boom"]);
        assert_eq!(state.visits, vec!["rescue", "report"]);
    }

    #[tokio::test]
    async fn test_node_failure_without_recovery_reaches_terminal() {
        let mut graph: Graph<TestState> = Graph::new("boom", "report");
        graph.add_node("boom", |_state: TestState| {
            Box::pin(async move { Err(FlowError::Custom("kaput".to_string())) })
        });
        graph.add_node("report", terminal);

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.failures, vec!["boom"]);
        assert_eq!(state.visits, vec!["report"]);
    }

    #[tokio::test]
    async fn test_stuck_node_is_recorded_and_run_finishes() {
        let mut graph: Graph<TestState> = Graph::new("a", "report");
        graph.add_node("a", visiting("a"));
        graph.add_node("report", terminal);
        // No edges out of "a" at all.
        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.failures, vec!["stuck:a"]);
        assert_eq!(state.visits, vec!["a", "report"]);
    }
}
