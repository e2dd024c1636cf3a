//! Confirmation controller behaviour
//!
//! Covers the cancel path, the compare-and-set race (exactly one of a
//! confirm/cancel pair wins), expiry, and the user-identity check.

mod common;

use common::*;
use movi::state::OutputStatus;
use movi::ErrorKind;
use uuid::Uuid;

const CANCEL_RESPONSE: &str =
    r#"{"action": "cancel_trip", "confidence": 0.95, "target_label": "Path-3 - 07:30"}"#;

async fn pending_session(harness: &TestAgent) -> Uuid {
    let outcome = harness
        .agent
        .handle_message(dashboard_message("Cancel Path-3 - 07:30"))
        .await;
    assert_eq!(
        outcome.agent_output.status,
        OutputStatus::AwaitingConfirmation
    );
    outcome.agent_output.session_id.expect("session id")
}

#[tokio::test]
async fn declining_cancels_without_mutation() {
    let harness = agent_with_responses(vec![CANCEL_RESPONSE]).await;
    let session_id = pending_session(&harness).await;

    let output = harness.confirmation.confirm(session_id, false, 1).await;
    assert_eq!(output.status, OutputStatus::Cancelled);
    assert!(output.success);

    assert_eq!(trip_status(&harness.pool, 3).await, "SCHEDULED");
    assert_eq!(audit_count(&harness.pool).await, 0);
}

#[tokio::test]
async fn second_resolution_loses_the_cas() {
    let harness = agent_with_responses(vec![CANCEL_RESPONSE]).await;
    let session_id = pending_session(&harness).await;

    let first = harness.confirmation.confirm(session_id, true, 1).await;
    assert_eq!(first.status, OutputStatus::Executed);

    // The losing caller is told the session is no longer pending.
    let second = harness.confirmation.confirm(session_id, false, 1).await;
    assert_eq!(second.status, OutputStatus::Error);
    assert_eq!(
        second.error.expect("error").kind,
        ErrorKind::SessionNotPending
    );

    // The mutation happened exactly once.
    assert_eq!(trip_status(&harness.pool, 3).await, "CANCELLED");
    assert_eq!(audit_count(&harness.pool).await, 1);
}

#[tokio::test]
async fn foreign_user_cannot_resolve_a_session() {
    let harness = agent_with_responses(vec![CANCEL_RESPONSE]).await;
    let session_id = pending_session(&harness).await;

    let output = harness.confirmation.confirm(session_id, true, 42).await;
    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(
        output.error.expect("error").kind,
        ErrorKind::SessionNotPending
    );
    assert_eq!(trip_status(&harness.pool, 3).await, "SCHEDULED");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let harness = agent_with_responses(vec![CANCEL_RESPONSE]).await;
    let session_id = pending_session(&harness).await;

    // Force the expiry into the past, as the reaper would find it.
    sqlx::query("UPDATE agent_sessions SET expires_at = '2000-01-01T00:00:00.000000Z' WHERE session_id = ?")
        .bind(session_id.to_string())
        .execute(&harness.pool)
        .await
        .unwrap();

    let output = harness.confirmation.confirm(session_id, true, 1).await;
    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(output.error.expect("error").kind, ErrorKind::SessionExpired);
    assert_eq!(trip_status(&harness.pool, 3).await, "SCHEDULED");
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let harness = agent_with_responses(vec![CANCEL_RESPONSE]).await;
    let output = harness
        .confirmation
        .confirm(Uuid::new_v4(), true, 1)
        .await;
    assert_eq!(output.status, OutputStatus::Error);
    assert_eq!(
        output.error.expect("error").kind,
        ErrorKind::SessionNotPending
    );
}
