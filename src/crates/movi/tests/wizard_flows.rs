//! Multi-turn wizard flows
//!
//! Wizard state must survive request boundaries through the session
//! store: every turn below is a fresh `handle_message` call, as it would
//! be over HTTP.

mod common;

use common::*;
use movi::state::OutputStatus;

// The stop wizard walks name -> latitude -> longitude -> confirm and
// commits on the final yes.
#[tokio::test]
async fn stop_wizard_collects_steps_and_commits() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_stop", "confidence": 0.9}"#,
    ])
    .await;

    // Turn 1: bare create_stop starts the wizard.
    let outcome = harness
        .agent
        .handle_message(manage_route_message("create a new stop"))
        .await;
    let output = outcome.agent_output;
    assert_eq!(output.status, OutputStatus::AwaitingClarification);
    assert!(output.session_id.is_some());
    assert!(output.message.to_lowercase().contains("called"));

    // Turns 2-4: answers, each a fresh request.
    for answer in ["Odeon North", "48.2", "16.36"] {
        let output = harness
            .agent
            .handle_message(manage_route_message(answer))
            .await
            .agent_output;
        assert_eq!(output.status, OutputStatus::AwaitingClarification, "answer '{}'", answer);
    }

    // Turn 5: confirm commits through the tool.
    let output = harness
        .agent
        .handle_message(manage_route_message("yes"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::Executed);

    let row: (f64, f64) =
        sqlx::query_as("SELECT latitude, longitude FROM stops WHERE name = 'Odeon North'")
            .fetch_one(&harness.pool)
            .await
            .expect("created stop");
    assert!((row.0 - 48.2).abs() < 1e-9);
    assert!((row.1 - 16.36).abs() < 1e-9);
    // The wizard commit audits its creation.
    assert_eq!(audit_count(&harness.pool).await, 1);
}

// Invalid input re-prompts without advancing.
#[tokio::test]
async fn invalid_step_input_reprompts_without_advancing() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_stop", "confidence": 0.9}"#,
    ])
    .await;

    harness
        .agent
        .handle_message(manage_route_message("create a new stop"))
        .await;
    harness
        .agent
        .handle_message(manage_route_message("Odeon North"))
        .await;

    // Latitude out of range: stay on the same step.
    let output = harness
        .agent
        .handle_message(manage_route_message("123"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::AwaitingClarification);
    assert!(output.message.contains("latitude"));

    // A valid latitude is accepted afterwards.
    let output = harness
        .agent
        .handle_message(manage_route_message("48.2"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::AwaitingClarification);
    assert!(output.message.to_lowercase().contains("longitude"));
}

// "cancel" at any step abandons the wizard without creating anything.
#[tokio::test]
async fn cancel_word_abandons_the_wizard() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_stop", "confidence": 0.9}"#,
    ])
    .await;

    harness
        .agent
        .handle_message(manage_route_message("create a new stop"))
        .await;
    harness
        .agent
        .handle_message(manage_route_message("Doomed Stop"))
        .await;

    let output = harness
        .agent
        .handle_message(manage_route_message("cancel"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::Cancelled);

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stops WHERE name = 'Doomed Stop'")
        .fetch_one(&harness.pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);

    // The next message starts fresh instead of resuming the wizard: the
    // scripted model repeats its last response, classifying it again.
    let output = harness
        .agent
        .handle_message(manage_route_message("create a new stop"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::AwaitingClarification);
    assert!(output.message.to_lowercase().contains("called"));
}

// The route wizard has no confirm step: it commits after direction.
#[tokio::test]
async fn route_wizard_commits_after_direction() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_route", "confidence": 0.9}"#,
    ])
    .await;

    let output = harness
        .agent
        .handle_message(manage_route_message("create a new route"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::AwaitingClarification);

    for answer in ["Route-D", "1", "08:30"] {
        let output = harness
            .agent
            .handle_message(manage_route_message(answer))
            .await
            .agent_output;
        assert_eq!(output.status, OutputStatus::AwaitingClarification, "answer '{}'", answer);
    }

    let output = harness
        .agent
        .handle_message(manage_route_message("down"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::Executed);

    let row: (String, i64, String) = sqlx::query_as(
        "SELECT route_name, path_id, direction FROM routes WHERE route_name = 'Route-D'",
    )
    .fetch_one(&harness.pool)
    .await
    .expect("created route");
    assert_eq!(row.1, 1);
    assert_eq!(row.2, "down");
}

// The path wizard enforces a minimum of two stops.
#[tokio::test]
async fn path_wizard_requires_two_stops() {
    let harness = agent_with_responses(vec![
        r#"{"action": "create_path", "confidence": 0.9}"#,
    ])
    .await;

    harness
        .agent
        .handle_message(manage_route_message("create a new path"))
        .await;
    harness
        .agent
        .handle_message(manage_route_message("Path-4"))
        .await;

    // One stop is rejected.
    let output = harness
        .agent
        .handle_message(manage_route_message("1"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::AwaitingClarification);
    assert!(output.message.contains("at least 2"));

    // Two stops advance to the confirm step, and yes commits.
    harness
        .agent
        .handle_message(manage_route_message("1, 6"))
        .await;
    let output = harness
        .agent
        .handle_message(manage_route_message("yes"))
        .await
        .agent_output;
    assert_eq!(output.status, OutputStatus::Executed);

    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM path_stops ps JOIN paths p ON p.id = ps.path_id
         WHERE p.path_name = 'Path-4'",
    )
    .fetch_one(&harness.pool)
    .await
    .unwrap();
    assert_eq!(count.0, 2);
}
