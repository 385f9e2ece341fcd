// LLM tool implementations for process session management

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use termbridge_terminal::{clean_interact_output, format_state_message};
use termbridge_toolcore::tool_context::ToolContext;
use termbridge_toolcore::{param, ParameterDefinition, Tool, ToolParameters, ToolResult};
use termbridge_types::{
    ExitReason, ProcessState, DEFAULT_INTERACT_TIMEOUT_MS, DEFAULT_READ_LENGTH,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_START_TIMEOUT_MS, INTERACT_OUTPUT_LINE_CAP,
    POLL_INTERVAL_MS,
};

use crate::helpers::{format_timing_info, OS_GUIDANCE, PATH_GUIDANCE};

fn waiting_annotation(state: &ProcessState, pid: i32) -> String {
    format!("\n🔄 {}", format_state_message(state, pid))
}

fn finished_annotation(state: &ProcessState, pid: i32) -> String {
    format!("\n✅ {}", format_state_message(state, pid))
}

/// Tool for starting a shell or REPL process with state detection
pub struct StartProcessTool {
    description: String,
}

impl Default for StartProcessTool {
    fn default() -> Self {
        Self::new()
    }
}

impl StartProcessTool {
    pub fn new() -> Self {
        let description = format!(
            "Start a new terminal process with intelligent state detection.\n\
             \n\
             PRIMARY TOOL FOR FILE ANALYSIS AND DATA PROCESSING\n\
             This is the ONLY correct tool for analyzing local files (CSV, JSON, logs, etc.).\n\
             \n\
             CRITICAL RULE: For ANY local file work, ALWAYS use this tool + interact_with_process.\n\
             \n\
             {}\n\
             \n\
             REQUIRED WORKFLOW FOR LOCAL FILES:\n\
             1. start_process(\"python3 -i\") - Start Python REPL for data analysis\n\
             2. interact_with_process(pid, \"import pandas as pd, numpy as np\")\n\
             3. interact_with_process(pid, \"df = pd.read_csv('/absolute/path/file.csv')\")\n\
             4. interact_with_process(pid, \"print(df.describe())\")\n\
             \n\
             COMMON FILE ANALYSIS PATTERNS:\n\
             • start_process(\"python3 -i\") → Python REPL for data analysis (RECOMMENDED)\n\
             • start_process(\"node -i\") → Node.js REPL for JSON processing\n\
             \n\
             {}",
            OS_GUIDANCE, PATH_GUIDANCE
        );
        Self { description }
    }
}

#[async_trait]
impl Tool for StartProcessTool {
    fn name(&self) -> &str {
        "start_process"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("command", "string", "Command to execute", required),
            param!(
                "timeout_ms",
                "integer",
                "How long to wait for the first prompt or exit (default: 30000)",
                optional
            ),
            param!("shell", "string", "Shell to use (default: platform shell)", optional),
            param!(
                "verbose_timing",
                "boolean",
                "Include timing diagnostics in the response",
                optional
            ),
        ])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let command = match params.get_required::<String>("command") {
            Ok(command) => command,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let timeout_ms = params
            .get_optional::<u64>("timeout_ms")
            .unwrap_or(None)
            .unwrap_or(DEFAULT_START_TIMEOUT_MS);
        let shell = params.get_optional::<String>("shell").unwrap_or(None);
        let verbose_timing = params
            .get_optional::<bool>("verbose_timing")
            .unwrap_or(None)
            .unwrap_or(false);

        let process_manager = match &context.process_manager {
            Some(pm) => pm,
            None => return ToolResult::error("Process manager not available".to_string()),
        };

        let manager = process_manager.lock().await;
        let outcome = manager
            .execute_command(&command, timeout_ms, shell.as_deref(), verbose_timing)
            .await;

        if outcome.pid == -1 {
            return ToolResult::error(outcome.output);
        }

        let state = manager.analyze_state(outcome.pid, &outcome.output).await;
        let status_message = if state.is_waiting_for_input {
            waiting_annotation(&state, outcome.pid)
        } else if state.is_finished {
            finished_annotation(&state, outcome.pid)
        } else if outcome.is_blocked {
            "\n⏳ Process is running. Use read_process_output to get more output.".to_string()
        } else {
            String::new()
        };

        let timing_message = outcome
            .timing
            .as_ref()
            .map(format_timing_info)
            .unwrap_or_default();

        ToolResult::success(format!(
            "Process started with PID {}\nInitial output:\n{}{}{}",
            outcome.pid, outcome.output, status_message, timing_message
        ))
    }
}

/// Tool for reading process output with file-like pagination
pub struct ReadProcessOutputTool;

#[async_trait]
impl Tool for ReadProcessOutputTool {
    fn name(&self) -> &str {
        "read_process_output"
    }

    fn description(&self) -> &str {
        "Read output from a running process with file-like pagination support.\n\
         \n\
         Supports partial output reading with offset and length parameters (like read_file):\n\
         - 'offset' (start line, default: 0)\n\
           * offset=0: Read NEW output since last read (default)\n\
           * Positive: Read from absolute line position\n\
           * Negative: Read last N lines from end (tail behavior)\n\
         - 'length' (max lines to read, default: 1000)\n\
         \n\
         Examples:\n\
         - offset: 0, length: 100     → First 100 NEW lines since last read\n\
         - offset: 500, length: 50    → Lines 500-549 (absolute position)\n\
         - offset: -20                → Last 20 lines (tail)"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("pid", "integer", "Process ID to read from", required),
            param!(
                "offset",
                "integer",
                "Start line: 0 = new since last read, >0 absolute, <0 tail (default: 0)",
                optional
            ),
            param!("length", "integer", "Max lines to read (default: 1000)", optional),
            param!(
                "timeout_ms",
                "integer",
                "How long to wait for new output when offset is 0 (default: 5000)",
                optional
            ),
        ])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let pid = match params.get_required::<i32>("pid") {
            Ok(pid) => pid,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let offset = params.get_optional::<i64>("offset").unwrap_or(None).unwrap_or(0);
        let length = params
            .get_optional::<usize>("length")
            .unwrap_or(None)
            .unwrap_or(DEFAULT_READ_LENGTH);
        let timeout_ms = params
            .get_optional::<u64>("timeout_ms")
            .unwrap_or(None)
            .unwrap_or(DEFAULT_READ_TIMEOUT_MS);

        let process_manager = match &context.process_manager {
            Some(pm) => pm,
            None => return ToolResult::error("Process manager not available".to_string()),
        };
        let manager = process_manager.lock().await;

        // Cursor-mode reads against a live session first wait for output
        // beyond the cursor, so a caller polling right after an interact
        // does not see an empty window
        if offset == 0 && manager.is_active(pid).await {
            let deadline = Instant::now() + Duration::from_millis(timeout_ms);
            loop {
                let line_count = manager.output_line_count(pid).await.unwrap_or(0);
                let cursor = manager.last_read_index(pid).await.unwrap_or(0);
                if line_count > cursor || Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }

        let Some(result) = manager.read_paginated(pid, offset, length).await else {
            return ToolResult::error(format!("No session found for PID {}", pid));
        };

        let status_message = if offset < 0 {
            format!(
                "[Reading last {} lines (total: {} lines)]",
                result.read_count, result.total_lines
            )
        } else if offset == 0 {
            if result.remaining > 0 {
                format!(
                    "[Reading {} new lines from line {} (total: {} lines, {} remaining)]",
                    result.read_count, result.read_from, result.total_lines, result.remaining
                )
            } else {
                format!(
                    "[Reading {} new lines (total: {} lines)]",
                    result.read_count, result.total_lines
                )
            }
        } else {
            format!(
                "[Reading {} lines from line {} (total: {} lines, {} remaining)]",
                result.read_count, result.read_from, result.total_lines, result.remaining
            )
        };

        let state_message = if result.is_complete {
            let runtime = result
                .runtime_ms
                .map(|ms| format!(" (runtime: {:.2}s)", ms as f64 / 1000.0))
                .unwrap_or_default();
            let exit_code = result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("\n✅ Process completed with exit code {}{}", exit_code, runtime)
        } else {
            let full_output = manager.full_output(pid).await.unwrap_or_default();
            let state = manager.analyze_state(pid, &full_output).await;
            if state.is_waiting_for_input {
                waiting_annotation(&state, pid)
            } else {
                String::new()
            }
        };

        let output = result.lines.join("\n");
        let response_text = if output.is_empty() {
            "(No output in requested range)".to_string()
        } else {
            output
        };

        ToolResult::success(format!(
            "{}\n\n{}{}",
            status_message, response_text, state_message
        ))
    }
}

/// Tool for sending input to a process and collecting the response
pub struct InteractWithProcessTool {
    description: String,
}

impl Default for InteractWithProcessTool {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractWithProcessTool {
    pub fn new() -> Self {
        let description = format!(
            "Send input to a running process and automatically receive the response.\n\
             \n\
             CRITICAL: THIS IS THE PRIMARY TOOL FOR ALL LOCAL FILE ANALYSIS\n\
             For ANY local file analysis (CSV, JSON, data processing), ALWAYS use this.\n\
             \n\
             REQUIRED INTERACTIVE WORKFLOW FOR FILE ANALYSIS:\n\
             1. Start REPL: start_process(\"python3 -i\")\n\
             2. Load libraries: interact_with_process(pid, \"import pandas as pd\")\n\
             3. Read file: interact_with_process(pid, \"df = pd.read_csv('/absolute/path/file.csv')\")\n\
             4. Analyze: interact_with_process(pid, \"print(df.describe())\")\n\
             \n\
             SMART DETECTION:\n\
             - Automatically waits for REPL prompt (>>>, >, etc.)\n\
             - Detects errors and completion states\n\
             \n\
             {}",
            PATH_GUIDANCE
        );
        Self { description }
    }
}

#[async_trait]
impl Tool for InteractWithProcessTool {
    fn name(&self) -> &str {
        "interact_with_process"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("pid", "integer", "Process ID to send input to", required),
            param!("input", "string", "Input to write to the process", required),
            param!(
                "timeout_ms",
                "integer",
                "How long to wait for a prompt or completion (default: 8000)",
                optional
            ),
            param!(
                "wait_for_prompt",
                "boolean",
                "Wait for the response before returning (default: true)",
                optional
            ),
            param!(
                "verbose_timing",
                "boolean",
                "Include timing diagnostics in the response",
                optional
            ),
        ])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let pid = match params.get_required::<i32>("pid") {
            Ok(pid) => pid,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let input = match params.get_required::<String>("input") {
            Ok(input) => input,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let timeout_ms = params
            .get_optional::<u64>("timeout_ms")
            .unwrap_or(None)
            .unwrap_or(DEFAULT_INTERACT_TIMEOUT_MS);
        let wait_for_prompt = params
            .get_optional::<bool>("wait_for_prompt")
            .unwrap_or(None)
            .unwrap_or(true);
        let verbose_timing = params
            .get_optional::<bool>("verbose_timing")
            .unwrap_or(None)
            .unwrap_or(false);

        let process_manager = match &context.process_manager {
            Some(pm) => pm,
            None => return ToolResult::error("Process manager not available".to_string()),
        };
        let manager = process_manager.lock().await;

        let start = Instant::now();
        let snapshot = manager.capture_snapshot(pid).await;

        if !manager.send_input(pid, &input).await {
            return ToolResult::error(format!(
                "Error: Failed to send input to process {}. The process may have exited or doesn't accept input.",
                pid
            ));
        }

        if !wait_for_prompt {
            let timing_message = if verbose_timing {
                format!("\n\n📊 Timing: {}ms", start.elapsed().as_millis())
            } else {
                String::new()
            };
            return ToolResult::success(format!(
                "✅ Input sent to process {}. Use read_process_output to get the response.{}",
                pid, timing_message
            ));
        }

        // Poll at a fixed interval, diffing fresh output against the
        // snapshot, until the detector reports waiting or finished
        let mut output = String::new();
        let mut exit_reason = ExitReason::Timeout;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let new_output = match &snapshot {
                Some(snapshot) => manager.output_since_snapshot(pid, snapshot).await,
                None => manager.full_output(pid).await,
            };
            if let Some(new_output) = new_output {
                if new_output.len() > output.len() {
                    output = new_output;
                }
            }

            let state = manager.analyze_state(pid, &output).await;
            if state.is_waiting_for_input {
                exit_reason = ExitReason::EarlyExitPeriodicCheck;
                break;
            }
            if state.is_finished {
                exit_reason = ExitReason::ProcessExit;
                break;
            }

            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        let mut clean_output = clean_interact_output(&output, &input);
        let state = manager.analyze_state(pid, &output).await;
        let timeout_reached =
            exit_reason == ExitReason::Timeout && !state.is_finished && !state.is_waiting_for_input;

        let mut truncation_message = String::new();
        let output_lines: Vec<&str> = clean_output.split('\n').collect();
        if output_lines.len() > INTERACT_OUTPUT_LINE_CAP {
            let total = output_lines.len();
            clean_output = output_lines[..INTERACT_OUTPUT_LINE_CAP].join("\n");
            truncation_message = format!(
                "\n\n⚠️ Output truncated: showing {} of {} lines ({} omitted).",
                INTERACT_OUTPUT_LINE_CAP,
                total,
                total - INTERACT_OUTPUT_LINE_CAP
            );
        }

        let status_message = if state.is_waiting_for_input {
            waiting_annotation(&state, pid)
        } else if state.is_finished {
            finished_annotation(&state, pid)
        } else if timeout_reached {
            "\n⏱️ Response may be incomplete (timeout reached)".to_string()
        } else {
            String::new()
        };

        let timing_message = if verbose_timing {
            format!(
                "\n\n📊 Timing: {}ms ({})",
                start.elapsed().as_millis(),
                exit_reason
            )
        } else {
            String::new()
        };

        if clean_output.trim().is_empty() && !timeout_reached {
            return ToolResult::success(format!(
                "✅ Input executed in process {}.\n📭 (No output produced){}{}",
                pid, status_message, timing_message
            ));
        }

        let mut response_text = format!("✅ Input executed in process {}", pid);
        if !clean_output.trim().is_empty() {
            response_text.push_str(&format!(":\n\n📤 Output:\n{}", clean_output));
        } else {
            response_text.push_str(".\n📭 (No output produced)");
        }
        response_text.push_str(&status_message);
        response_text.push_str(&truncation_message);
        response_text.push_str(&timing_message);

        ToolResult::success(response_text)
    }
}

/// Tool for terminating a session with interrupt-then-kill escalation
pub struct ForceTerminateTool;

#[async_trait]
impl Tool for ForceTerminateTool {
    fn name(&self) -> &str {
        "force_terminate"
    }

    fn description(&self) -> &str {
        "Force terminate a running terminal session. Use this to stop a process that is no longer needed or stuck."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("pid", "integer", "Process ID to terminate", required)])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let pid = match params.get_required::<i32>("pid") {
            Ok(pid) => pid,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let process_manager = match &context.process_manager {
            Some(pm) => pm,
            None => return ToolResult::error("Process manager not available".to_string()),
        };

        let manager = process_manager.lock().await;
        if manager.force_terminate(pid).await {
            ToolResult::success(format!(
                "Successfully initiated termination of session {}",
                pid
            ))
        } else {
            ToolResult::error(format!("No active session found for PID {}", pid))
        }
    }
}

/// Tool for listing the active sessions
pub struct ListSessionsTool;

#[async_trait]
impl Tool for ListSessionsTool {
    fn name(&self) -> &str {
        "list_sessions"
    }

    fn description(&self) -> &str {
        "List all active terminal sessions. Shows session status including PID, Blocked, Runtime."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::new()
    }

    async fn execute(&self, _params: ToolParameters, context: &ToolContext) -> ToolResult {
        let process_manager = match &context.process_manager {
            Some(pm) => pm,
            None => return ToolResult::error("Process manager not available".to_string()),
        };

        let manager = process_manager.lock().await;
        let sessions = manager.list_active().await;
        if sessions.is_empty() {
            return ToolResult::success("No active sessions".to_string());
        }

        let listing = sessions
            .iter()
            .map(|s| {
                format!(
                    "PID: {}, Blocked: {}, Runtime: {}s",
                    s.pid,
                    s.is_blocked,
                    (s.runtime_ms as f64 / 1000.0).round() as u64
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        ToolResult::success(listing)
    }
}
