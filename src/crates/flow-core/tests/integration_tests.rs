//! Integration tests for the graph runtime
//!
//! Builds a miniature intake pipeline (classify -> act -> report) and
//! drives it end to end, covering branch selection and failure capture in
//! one place.

use flow_core::{FlowControl, FlowFailure, Graph, NodeFuture, NodeId, END};

#[derive(Clone, Default)]
struct Intake {
    text: String,
    classified: Option<&'static str>,
    acted: bool,
    report: Option<String>,
    error: Option<String>,
    next: Option<NodeId>,
}

impl FlowControl for Intake {
    fn take_next_node(&mut self) -> Option<NodeId> {
        self.next.take()
    }
    fn record_failure(&mut self, failure: FlowFailure) {
        self.error = Some(format!("{:?}", failure));
    }
}

fn classify(mut state: Intake) -> NodeFuture<Intake> {
    Box::pin(async move {
        state.classified = Some(if state.text.contains("cancel") {
            "cancel"
        } else {
            "other"
        });
        Ok(state)
    })
}

fn act(mut state: Intake) -> NodeFuture<Intake> {
    Box::pin(async move {
        state.acted = true;
        Ok(state)
    })
}

fn report(mut state: Intake) -> NodeFuture<Intake> {
    Box::pin(async move {
        state.report = Some(match (state.classified, state.acted) {
            (Some("cancel"), true) => "cancelled".to_string(),
            _ => "ignored".to_string(),
        });
        state.next = Some(END.to_string());
        Ok(state)
    })
}

fn build() -> Graph<Intake> {
    let mut graph: Graph<Intake> = Graph::new("classify", "report");
    graph.add_node("classify", classify);
    graph.add_node("act", act);
    graph.add_node("report", report);
    graph.add_conditional_edge(
        "classify",
        "actionable",
        |s: &Intake| s.classified == Some("cancel"),
        "act",
    );
    graph.add_edge("classify", "report");
    graph.add_edge("act", "report");
    graph
}

#[tokio::test]
async fn actionable_text_flows_through_act() {
    let graph = build();
    let state = graph
        .run(Intake {
            text: "cancel the 07:30".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(state.report.as_deref(), Some("cancelled"));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn other_text_skips_straight_to_report() {
    let graph = build();
    let state = graph
        .run(Intake {
            text: "hello".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(state.report.as_deref(), Some("ignored"));
    assert!(!state.acted);
}

#[tokio::test]
async fn every_run_produces_a_report() {
    // Even a graph whose first node always fails must still terminate with
    // the report node having run.
    let mut graph: Graph<Intake> = Graph::new("broken", "report");
    graph.add_node("broken", |_s: Intake| {
        Box::pin(async move { Err(flow_core::FlowError::Custom("db down".to_string())) })
    });
    graph.add_node("report", report);

    let state = graph.run(Intake::default()).await.unwrap();
    assert!(state.report.is_some());
    assert!(state.error.is_some());
}
