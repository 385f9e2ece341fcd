use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use termbridge_terminal::ProcessManager;

/// Shared state handed to every tool execution.
///
/// Constructed once by the application and cloned per call; tools reach the
/// process-interaction engine exclusively through the manager handle carried
/// here, so tests can build an isolated context around their own manager.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Working directory for spawned processes and relative paths
    pub work_dir: PathBuf,
    /// Extra environment variables applied to child processes
    pub environment: HashMap<String, String>,
    /// Handle to the process-interaction engine, when one is attached
    pub process_manager: Option<Arc<Mutex<ProcessManager>>>,
}

impl ToolContext {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            environment: HashMap::new(),
            process_manager: None,
        }
    }

    pub fn with_process_manager(mut self, manager: Arc<Mutex<ProcessManager>>) -> Self {
        self.process_manager = Some(manager);
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.environment.insert(key, value);
        self
    }
}
