//! Shared response-formatting helpers for the tool implementations.

use termbridge_types::TimingInfo;

/// Platform hint baked into the LLM-facing tool descriptions
pub const OS_GUIDANCE: &str = if cfg!(target_os = "windows") {
    "Windows detected. Use Windows-style commands (dir, type, etc.) or PowerShell."
} else if cfg!(target_os = "macos") {
    "macOS detected. Use Unix-style commands (ls, cat, etc.)."
} else {
    "Linux detected. Use Unix-style commands (ls, cat, etc.)."
};

pub const PATH_GUIDANCE: &str =
    "IMPORTANT: Always use absolute paths (e.g., /home/user/project/file.txt). Relative paths may fail.";

/// The verbose timing block appended to a start_process response
pub fn format_timing_info(timing: &TimingInfo) -> String {
    let mut msg = String::from("\n\n📊 Timing Information:\n");
    msg.push_str(&format!("  Exit Reason: {}\n", timing.exit_reason));
    msg.push_str(&format!("  Total Duration: {}ms\n", timing.total_duration_ms));
    if let Some(ttfo) = timing.time_to_first_output_ms {
        msg.push_str(&format!("  Time to First Output: {}ms\n", ttfo));
    }
    msg
}
