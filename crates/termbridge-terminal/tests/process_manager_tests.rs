//! End-to-end engine tests against real child processes.

#![cfg(unix)]

use std::time::Duration;

use termbridge_terminal::ProcessManager;
use termbridge_types::ExitReason;

fn manager() -> (ProcessManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let manager = ProcessManager::new(dir.path().join("logs"));
    (manager, dir)
}

async fn wait_until_inactive(manager: &ProcessManager, pid: i32, max: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + max;
    while tokio::time::Instant::now() < deadline {
        if !manager.is_active(pid).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn short_command_runs_to_completion() {
    let (manager, _dir) = manager();
    let outcome = manager
        .execute_command("echo hello", 5_000, Some("/bin/bash"), false)
        .await;

    assert!(outcome.pid > 0);
    assert!(!outcome.is_blocked);
    assert!(outcome.output.contains("hello"));

    // The exit handoff happened before the spawn wait resolved
    assert!(!manager.is_active(outcome.pid).await);
    let read = manager.read_paginated(outcome.pid, 0, 1_000).await.unwrap();
    assert!(read.is_complete);
    assert_eq!(read.exit_code, Some(0));
    assert!(read.lines.iter().any(|l| l.contains("hello")));
}

#[tokio::test]
async fn failed_spawn_reports_pid_minus_one() {
    let (manager, _dir) = manager();
    let outcome = manager
        .execute_command("true", 2_000, Some("/nonexistent/bash"), false)
        .await;

    assert_eq!(outcome.pid, -1);
    assert!(outcome.output.starts_with("Error: Failed to execute command"));
    assert!(manager.list_active().await.is_empty());
}

#[tokio::test]
async fn silent_process_times_out_blocked() {
    let (manager, _dir) = manager();
    let outcome = manager
        .execute_command("sleep 5", 200, Some("/bin/bash"), true)
        .await;

    assert!(outcome.pid > 0);
    assert!(outcome.is_blocked);
    let timing = outcome.timing.unwrap();
    assert_eq!(timing.exit_reason, ExitReason::Timeout);
    assert!(timing.time_to_first_output_ms.is_none());

    let listed = manager.list_active().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].pid, outcome.pid);
    assert!(listed[0].is_blocked);

    assert!(manager.force_terminate(outcome.pid).await);
    assert!(wait_until_inactive(&manager, outcome.pid, Duration::from_secs(3)).await);
}

#[tokio::test]
async fn quick_prompt_resolves_the_spawn_early() {
    let (manager, _dir) = manager();
    let outcome = manager
        .execute_command("printf '>>> '; sleep 5", 5_000, Some("/bin/bash"), true)
        .await;

    assert!(outcome.pid > 0);
    assert!(outcome.is_blocked);
    assert!(outcome.output.contains(">>> "));

    let timing = outcome.timing.unwrap();
    assert_eq!(timing.exit_reason, ExitReason::EarlyExitQuickPattern);
    assert!(timing.total_duration_ms < 4_000);
    assert!(timing
        .events
        .iter()
        .any(|e| e.matched_pattern.as_deref() == Some("quick_pattern")));

    assert!(manager.force_terminate(outcome.pid).await);
}

#[tokio::test]
async fn input_round_trips_through_cat() {
    let (manager, _dir) = manager();
    let outcome = manager
        .execute_command("cat", 200, Some("/bin/bash"), false)
        .await;
    assert!(outcome.pid > 0);
    assert!(outcome.is_blocked);

    let snapshot = manager.capture_snapshot(outcome.pid).await.unwrap();
    assert!(manager.send_input(outcome.pid, "hello from the other side").await);

    // cat echoes the line back on stdout
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let new_output = manager
            .output_since_snapshot(outcome.pid, &snapshot)
            .await
            .unwrap();
        if new_output.contains("hello from the other side") {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "no echo before deadline"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let read = manager.read_paginated(outcome.pid, -1, 10).await.unwrap();
    assert!(!read.is_complete);

    assert!(manager.force_terminate(outcome.pid).await);
    assert!(wait_until_inactive(&manager, outcome.pid, Duration::from_secs(3)).await);

    // History survived the handoff to the completed cache
    let completed = manager.read_paginated(outcome.pid, 0, 1_000).await.unwrap();
    assert!(completed.is_complete);
    assert!(completed
        .lines
        .iter()
        .any(|l| l.contains("hello from the other side")));
}

#[tokio::test]
async fn input_to_unknown_pid_is_a_reported_failure() {
    let (manager, _dir) = manager();
    assert!(!manager.send_input(999_999, "anyone there?").await);
    assert!(!manager.force_terminate(999_999).await);
    assert!(manager.read_paginated(999_999, 0, 10).await.is_none());
}

#[tokio::test]
async fn exited_process_classifies_as_finished() {
    let (manager, _dir) = manager();
    let outcome = manager
        .execute_command("printf 'done\\n$ '", 5_000, Some("/bin/bash"), false)
        .await;

    // Wait out the race between the quick prompt and the exit handoff
    wait_until_inactive(&manager, outcome.pid, Duration::from_secs(3)).await;

    let output = manager.full_output(outcome.pid).await.unwrap();
    let state = manager.analyze_state(outcome.pid, &output).await;
    assert!(state.is_finished);
    assert!(!state.is_waiting_for_input);
}
