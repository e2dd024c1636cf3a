//! End-to-end scenarios over the full graph
//!
//! Each test drives the agent the way the HTTP layer would: a message
//! (and possibly a confirm) against the seeded fixtures, asserting on
//! the response envelope and on the database afterwards.

mod common;

use common::*;
use movi::state::{OutputStatus, SelectionType};

// S1: a risky cancel with bookings blocks, then executes on confirm.
#[tokio::test]
async fn risky_cancel_with_bookings_requires_confirmation() {
    let harness = agent_with_responses(vec![
        r#"{"action": "cancel_trip", "confidence": 0.95, "target_label": "Path-3 - 07:30"}"#,
    ])
    .await;

    let outcome = harness
        .agent
        .handle_message(dashboard_message("Cancel Path-3 - 07:30"))
        .await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::AwaitingConfirmation);
    let consequences = output.consequences.expect("consequences snapshot");
    assert_eq!(consequences.booking_count, 8);
    let session_id = output.session_id.expect("session id");

    // Nothing mutated yet.
    assert_eq!(trip_status(&harness.pool, 3).await, "SCHEDULED");
    assert_eq!(audit_count(&harness.pool).await, 0);

    // Confirm and verify the mutation plus exactly one audit row.
    let confirmed = harness.confirmation.confirm(session_id, true, 1).await;
    assert_eq!(confirmed.status, OutputStatus::Executed);
    assert!(confirmed.success);
    assert_eq!(trip_status(&harness.pool, 3).await, "CANCELLED");
    assert_eq!(audit_count(&harness.pool).await, 1);
}

// S2: a safe creation executes immediately with an object payload.
#[tokio::test]
async fn safe_stop_creation_executes_directly() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_stop", "confidence": 0.9, "parameters": {"name": "Odeon Circle"}}"#,
    ])
    .await;

    let outcome = harness
        .agent
        .handle_message(manage_route_message("create stop Odeon Circle"))
        .await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::Executed);
    let data = output.data.expect("payload");
    assert_eq!(data["type"], "object");

    // The row landed in the `name` column.
    let row: (String,) =
        sqlx::query_as("SELECT name FROM stops WHERE name = 'Odeon Circle'")
            .fetch_one(&harness.pool)
            .await
            .expect("created stop");
    assert_eq!(row.0, "Odeon Circle");
}

// S3: page gating rewrites the action and nothing mutates.
#[tokio::test]
async fn context_mismatch_names_the_required_page() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_route", "confidence": 0.9}"#,
    ])
    .await;

    let before: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM routes")
        .fetch_one(&harness.pool)
        .await
        .unwrap();

    let outcome = harness
        .agent
        .handle_message(dashboard_message("Help me create a new route"))
        .await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(output.action, "context_mismatch");
    assert!(output.message.contains("manageRoute"));
    assert!(!output.success);

    let after: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM routes")
        .fetch_one(&harness.pool)
        .await
        .unwrap();
    assert_eq!(before.0, after.0);
}

// S4: a vague assignment with UI context produces a filtered driver list.
#[tokio::test]
async fn vague_assignment_offers_filtered_driver_selection() {
    let harness = agent_with_responses(vec![
        r#"{"action": "assign_driver", "confidence": 0.9}"#,
    ])
    .await;

    let mut message = dashboard_message("assign driver");
    message.selected_trip_id = Some(8);
    let outcome = harness.agent.handle_message(message).await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::AwaitingClarification);
    assert_eq!(output.selection_type, Some(SelectionType::Driver));
    let options = output.options.expect("driver options");
    assert!(!options.is_empty());

    let names: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    // Sarah's shift covers 09:15 and she has no other trip.
    assert!(names.contains(&"Sarah Johnson"));
    // Mike drives trip 4 at 09:00, inside the 90-minute window of 09:15.
    assert!(!names.contains(&"Mike Chen"));
    // Priya's shift starts at 12:00; Alan is marked unavailable.
    assert!(!names.contains(&"Priya Sharma"));
    assert!(!names.contains(&"Alan Wood"));
}

// S5: structured selection bypasses the model entirely.
#[tokio::test]
async fn structured_assignment_executes_without_model_call() {
    let harness = agent_with_responses(vec!["unused"]).await;

    let outcome = harness
        .agent
        .handle_message(dashboard_message(
            "STRUCTURED_CMD:assign_driver|trip_id:8|driver_id:1",
        ))
        .await;
    let output = outcome.agent_output;

    assert_eq!(harness.model.call_count(), 0, "no model call on the fast path");
    assert_eq!(output.status, OutputStatus::Executed);

    let row: (Option<i64>,) =
        sqlx::query_as("SELECT driver_id FROM deployments WHERE trip_id = 8")
            .fetch_one(&harness.pool)
            .await
            .expect("deployment row");
    assert_eq!(row.0, Some(1));
    assert_eq!(audit_count(&harness.pool).await, 1);
}

// S6: assigning into an orphaned deployment row updates it in place.
#[tokio::test]
async fn orphaned_deployment_row_is_updated_not_reinserted() {
    let harness = agent_with_responses(vec!["unused"]).await;

    let outcome = harness
        .agent
        .handle_message(dashboard_message(
            "STRUCTURED_CMD:assign_vehicle|trip_id:5|vehicle_id:4",
        ))
        .await;
    let output = outcome.agent_output;
    assert_eq!(output.status, OutputStatus::Executed);

    // Still exactly one deployment row for trip 5, now carrying the
    // vehicle.
    let rows: Vec<(i64, Option<i64>)> =
        sqlx::query_as("SELECT id, vehicle_id FROM deployments WHERE trip_id = 5")
            .fetch_all(&harness.pool)
            .await
            .expect("deployment rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1, Some(4));
}

// S7: a path-scoped action resolves a path, never a similarly-named trip.
#[tokio::test]
async fn path_action_resolves_path_not_trip() {
    let harness = agent_with_responses(vec![
        r#"{"action": "list_stops_for_path", "confidence": 0.9, "target_label": "Path-2"}"#,
    ])
    .await;

    let outcome = harness
        .agent
        .handle_message(dashboard_message("List all stops for 'Path-2'"))
        .await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::Executed);
    let data = output.data.expect("payload");
    assert_eq!(data["type"], "table");

    // Path-2's stops in seq order, from the path_stops join; the trip
    // named "Path-2 - 06:00" must not have been picked instead.
    let names: Vec<String> = data["data"]
        .as_array()
        .expect("rows")
        .iter()
        .map(|row| row["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["Central Depot", "Airport Road", "Old Town"]);
}

// The model path being down entirely still yields a usable parse for
// high-value commands via the regex fallback.
#[tokio::test]
async fn regex_fallback_carries_cancel_when_model_is_down() {
    let harness = agent_with_responses(vec![]).await; // empty script: every call errors

    let outcome = harness
        .agent
        .handle_message(dashboard_message("cancel trip Path-1 - 07:00"))
        .await;
    let output = outcome.agent_output;

    // Trip 1 has no bookings, so the cancel executes immediately.
    assert_eq!(output.action, "cancel_trip");
    assert_eq!(output.status, OutputStatus::Executed);
    assert_eq!(trip_status(&harness.pool, 1).await, "CANCELLED");
}

// Broken UI payloads carrying the literal token `undefined` are rejected.
#[tokio::test]
async fn undefined_token_is_rejected_as_invalid_selection() {
    let harness = agent_with_responses(vec!["unused"]).await;

    let outcome = harness
        .agent
        .handle_message(dashboard_message("assign undefined to undefined"))
        .await;
    let output = outcome.agent_output;

    assert_eq!(harness.model.call_count(), 0);
    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(output.error.expect("error").kind, movi::ErrorKind::InvalidSelection);
}

// Resolver miss routes through the fallback with suggestions.
#[tokio::test]
async fn unresolvable_target_produces_suggestions() {
    let harness = agent_with_responses(vec![
        r#"{"action": "cancel_trip", "confidence": 0.9, "target_label": "Ghost - 99:99"}"#,
    ])
    .await;

    let outcome = harness
        .agent
        .handle_message(dashboard_message("Cancel Ghost - 99:99"))
        .await;
    let output = outcome.agent_output;

    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(output.error.expect("error").kind, movi::ErrorKind::TripNotFound);
    assert!(output.suggestions.is_some());
}
