use clap::Parser;
use std::path::PathBuf;

/// Terminal process-interaction MCP server for AI agents
#[derive(Parser, Debug)]
#[command(name = "termbridge", version, about)]
pub struct Cli {
    /// Working directory for spawned processes (defaults to the current
    /// directory)
    #[arg(long, env = "TERMBRIDGE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Directory for per-session I/O logs
    #[arg(long, env = "TERMBRIDGE_LOG_DIR", default_value = "logs/terminals")]
    pub log_dir: PathBuf,

    /// Print the tool definitions as JSON and exit
    #[arg(long)]
    pub list_tools: bool,
}
