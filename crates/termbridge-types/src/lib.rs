//! Core types and structures for termbridge
//!
//! This crate provides the foundational types shared across all termbridge
//! crates: process state classification results, timing diagnostics, and the
//! paginated read payloads exchanged between the engine and the tool layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for starting a process and waiting for its first prompt
pub const DEFAULT_START_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for a paginated read waiting on fresh output
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for an interact round-trip
pub const DEFAULT_INTERACT_TIMEOUT_MS: u64 = 8_000;

/// Default number of lines served by a paginated read
pub const DEFAULT_READ_LENGTH: usize = 1_000;

/// Hard cap on lines returned by an interact response, independent of
/// pagination length
pub const INTERACT_OUTPUT_LINE_CAP: usize = 1_000;

/// Maximum number of completed sessions retained before FIFO eviction
pub const COMPLETED_SESSION_CAP: usize = 100;

/// Uniform polling interval for interact and read wait loops
pub const POLL_INTERVAL_MS: u64 = 50;

/// Grace period between the interrupt signal and the forced kill
pub const TERMINATE_GRACE_MS: u64 = 1_000;

// ============================================================================
// Process State
// ============================================================================

/// Derived classification of a session's current disposition.
///
/// Recomputed on demand from recent output text and exit status; never
/// cached. `is_finished` and `is_waiting_for_input` are mutually exclusive,
/// and an exited process is always finished regardless of trailing text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessState {
    pub is_waiting_for_input: bool,
    pub is_finished: bool,
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detected_prompt: Option<String>,
    pub last_output: String,
}

impl ProcessState {
    /// State for a process that has exited
    pub fn finished(last_output: String) -> Self {
        Self {
            is_waiting_for_input: false,
            is_finished: true,
            is_running: false,
            detected_prompt: None,
            last_output,
        }
    }

    /// State for a process blocked on an interactive prompt
    pub fn waiting(prompt: String, last_output: String) -> Self {
        Self {
            is_waiting_for_input: true,
            is_finished: false,
            is_running: false,
            detected_prompt: Some(prompt),
            last_output,
        }
    }

    /// State for a process still computing
    pub fn running(last_output: String) -> Self {
        Self {
            is_waiting_for_input: false,
            is_finished: false,
            is_running: true,
            detected_prompt: None,
            last_output,
        }
    }
}

// ============================================================================
// Timing Diagnostics
// ============================================================================

/// Which event ended a spawn or interact wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    EarlyExitQuickPattern,
    EarlyExitPeriodicCheck,
    ProcessExit,
    Timeout,
    NoWait,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::EarlyExitQuickPattern => "early_exit_quick_pattern",
            ExitReason::EarlyExitPeriodicCheck => "early_exit_periodic_check",
            ExitReason::ProcessExit => "process_exit",
            ExitReason::Timeout => "timeout",
            ExitReason::NoWait => "no_wait",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source stream of an output event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSource {
    Stdout,
    Stderr,
}

/// One observed output chunk, recorded only when verbose timing is requested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEvent {
    pub timestamp: DateTime<Utc>,
    pub delta_ms: u64,
    pub source: OutputSource,
    pub len: usize,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub matched_pattern: Option<String>,
}

/// Timing diagnostics for a spawn or interact call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingInfo {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub exit_reason: ExitReason,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_to_first_output_ms: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<OutputEvent>,
}

// ============================================================================
// Spawn and Read Payloads
// ============================================================================

/// Result of spawning a process and waiting for its first state transition.
///
/// A failed spawn is reported with `pid == -1` and an error message in
/// `output`, never as a registered session.
#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    pub pid: i32,
    pub output: String,
    pub is_blocked: bool,
    pub timing: Option<TimingInfo>,
}

/// Result of a paginated read over a session's line buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedRead {
    pub lines: Vec<String>,
    pub total_lines: usize,
    pub read_from: usize,
    pub read_count: usize,
    pub remaining: usize,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub runtime_ms: Option<u64>,
}

/// One row of the active-session listing, in registration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSessionInfo {
    pub pid: i32,
    pub is_blocked: bool,
    pub runtime_ms: u64,
}

/// One row of the OS-wide process table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: i32,
    pub command: String,
    pub cpu: String,
    pub memory: String,
}
