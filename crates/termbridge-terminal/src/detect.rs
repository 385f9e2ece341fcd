//! Heuristic process-state classification.
//!
//! Two independent signals: a fast, conservative quick-prompt regex applied
//! to individual chunks as they arrive (latency path), and a broader
//! classification over the whole recent output applied on poll ticks.
//! Detection is read-only; it never mutates buffered output. A process that
//! has exited is always reported finished, never waiting, regardless of
//! trailing text.

use regex::Regex;
use termbridge_types::ProcessState;

/// Classification strategy. Shell- or REPL-specific detectors implement
/// this to replace the default heuristics without touching the spawn or
/// interact coordination.
pub trait StateDetector: Send + Sync {
    /// Classify the accumulated output together with the exit status, if
    /// the process has been reaped
    fn classify(&self, output: &str, exit_code: Option<i32>) -> ProcessState;

    /// Fast per-chunk check used while a spawn is being awaited. The default
    /// delegates to `classify`; implementations may substitute a cheaper,
    /// more conservative test.
    fn quick_prompt(&self, chunk: &str) -> Option<String> {
        let state = self.classify(chunk, None);
        if state.is_waiting_for_input {
            state.detected_prompt
        } else {
            None
        }
    }
}

/// Default detector: common shell and REPL prompts plus a generic trailing
/// input-question heuristic
pub struct PromptDetector {
    quick_pattern: Regex,
    prompt_patterns: Vec<Regex>,
    input_question: Regex,
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptDetector {
    pub fn new() -> Self {
        // Named REPL prompts come before the bare shell sigils so the
        // detected prompt is as specific as possible
        let prompt_sources = [
            r">>> ?$",          // python
            r"^\.\.\. ?$",      // python continuation, alone on its line
            r"In \[\d+\]: ?$",  // ipython
            r"\(Pdb\) ?$",      // pdb
            r"irb\([^)]*\)[>*] ?$", // irb
            r"mysql> ?$",
            r"sqlite> ?$",
            r"ftp> ?$",
            r"> ?$",            // node and other chevron REPLs
            r"\$ ?$",           // POSIX shells
            r"# ?$",            // root shells
            r"% ?$",            // zsh/csh
        ];
        Self {
            quick_pattern: Regex::new(r">>>\s*$|>\s*$|\$\s*$|#\s*$").unwrap(),
            prompt_patterns: prompt_sources
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
            input_question: Regex::new(r"[^\s][:?] $").unwrap(),
        }
    }

    /// The final, possibly still-open line of the output
    fn trailing_line(output: &str) -> &str {
        output.rsplit('\n').next().unwrap_or("")
    }
}

impl StateDetector for PromptDetector {
    fn classify(&self, output: &str, exit_code: Option<i32>) -> ProcessState {
        let last_output = Self::trailing_line(output.trim_end_matches('\n')).to_string();

        if exit_code.is_some() {
            return ProcessState::finished(last_output);
        }

        // Only the open line can be a prompt: a newline after it means the
        // process moved on
        let tail = Self::trailing_line(output);
        for pattern in &self.prompt_patterns {
            if let Some(matched) = pattern.find(tail) {
                let prompt = matched.as_str().trim_end().to_string();
                return ProcessState::waiting(prompt, last_output);
            }
        }
        if self.input_question.is_match(tail) {
            return ProcessState::waiting(tail.trim_end().to_string(), last_output);
        }

        ProcessState::running(last_output)
    }

    fn quick_prompt(&self, chunk: &str) -> Option<String> {
        self.quick_pattern
            .find(chunk)
            .map(|m| m.as_str().trim().to_string())
    }
}

/// Strip the echoed input line from an interact response. Applies only to
/// interact responses; the buffered history keeps the echo.
pub fn clean_interact_output(output: &str, input: &str) -> String {
    let input = input.trim();
    let mut lines: Vec<&str> = output.lines().collect();

    // Drop leading blank lines, then the echo if it is the first thing the
    // process printed back
    let mut start = 0;
    while start < lines.len() && lines[start].trim().is_empty() {
        start += 1;
    }
    if start < lines.len() && lines[start].trim() == input {
        start += 1;
    }
    lines.drain(..start);

    lines.join("\n").trim_start_matches('\n').to_string()
}

/// Human/agent-readable annotation for a classified state
pub fn format_state_message(state: &ProcessState, pid: i32) -> String {
    if state.is_waiting_for_input {
        match &state.detected_prompt {
            Some(prompt) => format!(
                "Process {} is waiting for input (prompt: '{}')",
                pid, prompt
            ),
            None => format!("Process {} is waiting for input", pid),
        }
    } else if state.is_finished {
        format!("Process {} has finished", pid)
    } else {
        format!("Process {} is still running", pid)
    }
}
