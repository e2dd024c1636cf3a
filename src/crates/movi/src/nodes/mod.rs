//! Graph nodes and wiring
//!
//! The agent is a directed graph of processing stages:
//!
//! ```text
//! parse_intent ──► resolve_target ──► check_consequences ──┬──► execute_action ──► report_result
//!      │                 │                                 ├──► driver_selection_provider ──► report_result
//!      │                 │                                 ├──► vehicle_selection_provider ─► report_result
//!      │                 │                                 └──► report_result (confirmation)
//!      ├──► wizard_step ──► report_result
//!      └──► fallback ──► report_result
//! ```
//!
//! The decision router's predicates guard the conditional edges;
//! declaration order is precedence.

pub mod consequences;
pub mod execute;
pub mod fallback;
pub mod report;
pub mod resolve;
pub mod router;
pub mod selection;
pub mod wizard;

use std::sync::Arc;

use flow_core::{Graph, NodeFuture};

use crate::context::AgentContext;
use crate::state::FlowState;

/// Node names, used in wiring and logs
pub mod names {
    pub const PARSE_INTENT: &str = "parse_intent";
    pub const RESOLVE_TARGET: &str = "resolve_target";
    pub const CHECK_CONSEQUENCES: &str = "check_consequences";
    pub const DRIVER_SELECTION: &str = "driver_selection_provider";
    pub const VEHICLE_SELECTION: &str = "vehicle_selection_provider";
    pub const WIZARD_STEP: &str = "wizard_step";
    pub const EXECUTE_ACTION: &str = "execute_action";
    pub const FALLBACK: &str = "fallback";
    pub const REPORT_RESULT: &str = "report_result";
}

fn node<F, Fut>(ctx: &Arc<AgentContext>, f: F) -> impl Fn(FlowState) -> NodeFuture<FlowState>
where
    F: Fn(Arc<AgentContext>, FlowState) -> Fut + Send + Sync + Copy + 'static,
    Fut: std::future::Future<Output = flow_core::Result<FlowState>> + Send + 'static,
{
    let ctx = ctx.clone();
    move |state| -> NodeFuture<FlowState> {
        let ctx = ctx.clone();
        Box::pin(f(ctx, state))
    }
}

/// Build the agent graph over a shared context
pub fn build_graph(ctx: Arc<AgentContext>) -> Graph<FlowState> {
    use names::*;

    let mut graph: Graph<FlowState> = Graph::new(PARSE_INTENT, REPORT_RESULT);
    graph.set_recovery(FALLBACK);

    graph.add_node(PARSE_INTENT, node(&ctx, crate::intent::parse_intent_node));
    graph.add_node(RESOLVE_TARGET, node(&ctx, resolve::resolve_target_node));
    graph.add_node(CHECK_CONSEQUENCES, node(&ctx, consequences::check_consequences_node));
    graph.add_node(DRIVER_SELECTION, node(&ctx, selection::driver_selection_node));
    graph.add_node(VEHICLE_SELECTION, node(&ctx, selection::vehicle_selection_node));
    graph.add_node(WIZARD_STEP, node(&ctx, wizard::wizard_step_node));
    graph.add_node(EXECUTE_ACTION, node(&ctx, execute::execute_action_node));
    graph.add_node(FALLBACK, node(&ctx, fallback::fallback_node));
    graph.add_node(REPORT_RESULT, node(&ctx, report::report_result_node));

    // parse_intent
    graph.add_conditional_edge(PARSE_INTENT, "wizard_turn", router::wizard_active, WIZARD_STEP);
    graph.add_conditional_edge(PARSE_INTENT, "page_mismatch", router::context_mismatch, REPORT_RESULT);
    graph.add_conditional_edge(PARSE_INTENT, "unknown", router::unknown_action, FALLBACK);
    graph.add_conditional_edge(PARSE_INTENT, "parse_error", router::failed, REPORT_RESULT);
    graph.add_conditional_edge(PARSE_INTENT, "wizard_start", router::wizard_entry, WIZARD_STEP);
    graph.add_conditional_edge(PARSE_INTENT, "clarify", router::needs_clarification, REPORT_RESULT);
    graph.add_edge(PARSE_INTENT, RESOLVE_TARGET);

    // resolve_target
    graph.add_conditional_edge(RESOLVE_TARGET, "ambiguous", router::ambiguous, REPORT_RESULT);
    graph.add_conditional_edge(RESOLVE_TARGET, "not_found", router::not_found, FALLBACK);
    graph.add_conditional_edge(RESOLVE_TARGET, "resolve_error", router::failed, REPORT_RESULT);
    graph.add_edge(RESOLVE_TARGET, CHECK_CONSEQUENCES);

    // check_consequences (the decision router's main seat)
    graph.add_conditional_edge(CHECK_CONSEQUENCES, "check_error", router::failed, REPORT_RESULT);
    graph.add_conditional_edge(CHECK_CONSEQUENCES, "confirm", router::needs_confirmation, REPORT_RESULT);
    graph.add_conditional_edge(CHECK_CONSEQUENCES, "pick_driver", router::needs_driver_selection, DRIVER_SELECTION);
    graph.add_conditional_edge(CHECK_CONSEQUENCES, "pick_vehicle", router::needs_vehicle_selection, VEHICLE_SELECTION);
    graph.add_edge(CHECK_CONSEQUENCES, EXECUTE_ACTION);

    // Providers, wizard, executor and fallback all report.
    graph.add_edge(DRIVER_SELECTION, REPORT_RESULT);
    graph.add_edge(VEHICLE_SELECTION, REPORT_RESULT);
    graph.add_edge(WIZARD_STEP, REPORT_RESULT);
    graph.add_edge(EXECUTE_ACTION, REPORT_RESULT);
    graph.add_edge(FALLBACK, REPORT_RESULT);

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_session::InMemorySessionStore;
    use llm::testing::ScriptedChatModel;

    #[tokio::test]
    async fn test_graph_wiring_validates() {
        let db = crate::db::Database::with_max_connections("sqlite::memory:", 1)
            .await
            .unwrap();
        db.run_migrations().await.unwrap();
        let ctx = AgentContext::new(
            db.pool(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(ScriptedChatModel::always("{}")),
            true,
        );
        let graph = build_graph(ctx);
        assert!(graph.validate().is_ok());
        assert_eq!(graph.node_count(), 9);
    }
}
