//! Structured-command grammar over the full graph

mod common;

use common::*;
use movi::state::OutputStatus;
use movi::ErrorKind;

#[tokio::test]
async fn unknown_action_in_structured_command_errors() {
    let harness = agent_with_responses(vec!["unused"]).await;
    let output = harness
        .agent
        .handle_message(dashboard_message("STRUCTURED_CMD:launch_rocket|trip_id:1"))
        .await
        .agent_output;

    assert_eq!(harness.model.call_count(), 0);
    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(output.error.expect("error").kind, ErrorKind::UnknownAction);
}

#[tokio::test]
async fn missing_required_key_is_reported() {
    let harness = agent_with_responses(vec!["unused"]).await;
    let output = harness
        .agent
        .handle_message(dashboard_message("STRUCTURED_CMD:update_trip_time|trip_id:1"))
        .await
        .agent_output;

    assert_eq!(output.status, OutputStatus::Error);
    let error = output.error.expect("error");
    assert_eq!(error.kind, ErrorKind::MissingParameters);
    assert!(error.message.contains("new_time"));
}

#[tokio::test]
async fn quoted_values_carry_spaces_through_the_grammar() {
    let harness = agent_with_responses(vec!["unused"]).await;
    let output = harness
        .agent
        .handle_message(manage_route_message(
            "STRUCTURED_CMD:create_stop|name:\"Long Stop Name\"",
        ))
        .await
        .agent_output;

    assert_eq!(output.status, OutputStatus::Executed);
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM stops WHERE name = 'Long Stop Name'")
            .fetch_one(&harness.pool)
            .await
            .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn unknown_keys_are_ignored_for_forward_compatibility() {
    let harness = agent_with_responses(vec!["unused"]).await;
    let output = harness
        .agent
        .handle_message(dashboard_message(
            "STRUCTURED_CMD:get_trip_status|trip_id:1|shiny:new",
        ))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::Executed);
}

#[tokio::test]
async fn page_gating_applies_to_structured_commands_too() {
    let harness = agent_with_responses(vec!["unused"]).await;
    // A manageRoute-only action issued from the dashboard.
    let output = harness
        .agent
        .handle_message(dashboard_message(
            "STRUCTURED_CMD:create_stop|name:\"Wrong Page Stop\"",
        ))
        .await
        .agent_output;

    assert_eq!(output.action, "context_mismatch");
    assert_eq!(output.status, OutputStatus::Error);
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM stops WHERE name = 'Wrong Page Stop'")
            .fetch_one(&harness.pool)
            .await
            .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn no_page_context_bypasses_gating() {
    let harness = agent_with_responses(vec!["unused"]).await;
    let mut message = dashboard_message("STRUCTURED_CMD:create_stop|name:\"Headless Stop\"");
    message.page = None;

    let output = harness.agent.handle_message(message).await.agent_output;
    assert_eq!(output.status, OutputStatus::Executed);
}

#[tokio::test]
async fn confirmation_button_roundtrip_via_structured_selection() {
    // The vehicle picker flow: trip 1 already carries vehicle 1, so the
    // structured assignment of vehicle 2 must park behind a
    // confirmation, then apply on confirm.
    let harness = agent_with_responses(vec!["unused"]).await;
    let outcome = harness
        .agent
        .handle_message(dashboard_message(
            "STRUCTURED_CMD:assign_vehicle|trip_id:1|vehicle_id:2",
        ))
        .await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::AwaitingConfirmation);
    let session_id = output.session_id.expect("session id");

    let confirmed = harness.confirmation.confirm(session_id, true, 1).await;
    assert_eq!(confirmed.status, OutputStatus::Executed);

    let row: (Option<i64>,) =
        sqlx::query_as("SELECT vehicle_id FROM deployments WHERE trip_id = 1")
            .fetch_one(&harness.pool)
            .await
            .unwrap();
    assert_eq!(row.0, Some(2));
}
