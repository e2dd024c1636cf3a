//! flow-core: a small typed graph runtime
//!
//! Executes a registered graph of async node functions by threading a
//! caller-defined state record from node to node until a terminal node is
//! reached. Control flow is expressed as unconditional edges plus
//! conditional edges whose predicates are pure functions of state, with an
//! escape hatch: a node may name its successor directly by setting a
//! `next_node` override on the state.
//!
//! The runtime is strictly sequential within one run; parallelism lives at
//! the caller's request boundary. An iteration cap bounds every run so that
//! a miswired graph terminates instead of spinning.
//!
//! # Example
//!
//! ```rust
//! use flow_core::{FlowControl, FlowFailure, Graph, NodeId, END};
//!
//! #[derive(Clone, Default)]
//! struct Counter {
//!     value: u32,
//!     next: Option<NodeId>,
//!     failed: bool,
//! }
//!
//! impl FlowControl for Counter {
//!     fn take_next_node(&mut self) -> Option<NodeId> {
//!         self.next.take()
//!     }
//!     fn record_failure(&mut self, _failure: FlowFailure) {
//!         self.failed = true;
//!     }
//! }
//!
//! async fn demo() -> flow_core::Result<()> {
//!     let mut graph: Graph<Counter> = Graph::new("bump", "done");
//!     graph.add_node("bump", |mut state: Counter| {
//!         Box::pin(async move {
//!             state.value += 1;
//!             Ok(state)
//!         })
//!     });
//!     graph.add_node("done", |mut state: Counter| {
//!         Box::pin(async move {
//!             state.next = Some(END.to_string());
//!             Ok(state)
//!         })
//!     });
//!     graph.add_conditional_edge("bump", "again", |s: &Counter| s.value < 3, "bump");
//!     graph.add_edge("bump", "done");
//!
//!     let final_state = graph.run(Counter::default()).await?;
//!     assert_eq!(final_state.value, 3);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod graph;
pub mod runtime;
pub mod state;

pub use error::{FlowError, Result};
pub use graph::{Edge, Graph, NodeFn, NodeFuture, NodeId, END, START};
pub use runtime::MAX_ITERATIONS;
pub use state::{FlowControl, FlowFailure};
