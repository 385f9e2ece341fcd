// OS-scoped tools: the system process table and raw signal delivery.
// Neither is session-aware; both operate on the host process table.

use std::collections::HashMap;

use async_trait::async_trait;
use termbridge_toolcore::tool_context::ToolContext;
use termbridge_toolcore::{param, ParameterDefinition, Tool, ToolParameters, ToolResult};
use termbridge_types::ProcessInfo;
use tokio::process::Command as AsyncCommand;

/// Tool for listing all processes on the system
pub struct ListProcessesTool;

#[async_trait]
impl Tool for ListProcessesTool {
    fn name(&self) -> &str {
        "list_processes"
    }

    fn description(&self) -> &str {
        "List all running processes on the system. Returns PID, command, CPU, and memory usage."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::new()
    }

    async fn execute(&self, _params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let output = if cfg!(windows) {
            AsyncCommand::new("tasklist").output().await
        } else {
            AsyncCommand::new("ps").arg("aux").output().await
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return ToolResult::error(format!("Error: Failed to list processes: {}", e))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let processes: Vec<ProcessInfo> = stdout
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 4 {
                    return None;
                }
                let pid = parts[1].parse::<i32>().ok()?;
                Some(ProcessInfo {
                    pid,
                    command: parts[parts.len() - 1].to_string(),
                    cpu: parts[2].to_string(),
                    memory: parts[3].to_string(),
                })
            })
            .collect();

        let listing = processes
            .iter()
            .map(|p| {
                format!(
                    "PID: {}, Command: {}, CPU: {}, Memory: {}",
                    p.pid, p.command, p.cpu, p.memory
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        ToolResult::success(listing)
    }
}

/// Tool for terminating an arbitrary process by pid
pub struct KillProcessTool;

#[async_trait]
impl Tool for KillProcessTool {
    fn name(&self) -> &str {
        "kill_process"
    }

    fn description(&self) -> &str {
        "Terminate a running process by PID. Use with caution."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("pid", "integer", "Process ID to kill", required)])
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let pid = match params.get_required::<i32>("pid") {
            Ok(pid) => pid,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match kill_by_pid(pid).await {
            Ok(()) => ToolResult::success(format!("Successfully terminated process {}", pid)),
            Err(e) => ToolResult::error(format!("Error: Failed to kill process: {}", e)),
        }
    }
}

#[cfg(unix)]
async fn kill_by_pid(pid: i32) -> Result<(), std::io::Error> {
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(windows)]
async fn kill_by_pid(pid: i32) -> Result<(), std::io::Error> {
    let status = AsyncCommand::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "taskkill exited with {}",
            status
        )))
    }
}
