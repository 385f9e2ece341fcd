use std::env;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use termbridge_terminal::ProcessManager;
use termbridge_toolcore::{ToolContext, ToolRegistry};
use termbridge_tools::{
    ForceTerminateTool, InteractWithProcessTool, KillProcessTool, ListProcessesTool,
    ListSessionsTool, ReadProcessOutputTool, StartProcessTool,
};

use crate::cli::Cli;

/// Register the seven process tools
pub fn build_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(StartProcessTool::new());
    registry.register(ReadProcessOutputTool);
    registry.register(InteractWithProcessTool::new());
    registry.register(ForceTerminateTool);
    registry.register(ListSessionsTool);
    registry.register(ListProcessesTool);
    registry.register(KillProcessTool);
    registry
}

/// Construct the execution context: one process manager for the server's
/// lifetime, rooted at the configured workspace
pub fn build_context(cli: &Cli) -> Result<ToolContext> {
    let work_dir = match &cli.workspace {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };

    let manager = ProcessManager::new(cli.log_dir.clone()).with_work_dir(work_dir.clone());

    Ok(ToolContext::new(work_dir).with_process_manager(Arc::new(Mutex::new(manager))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_all_seven_tools() {
        let registry = build_registry();
        for name in [
            "start_process",
            "read_process_output",
            "interact_with_process",
            "force_terminate",
            "list_sessions",
            "list_processes",
            "kill_process",
        ] {
            assert!(registry.has_tool(name), "missing tool {name}");
        }
        assert_eq!(registry.get_all_tools().len(), 7);
    }
}
