use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use termbridge_app::{build_context, build_registry, Cli, McpServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let registry = build_registry();

    if cli.list_tools {
        println!(
            "{}",
            serde_json::to_string_pretty(&registry.tool_definitions())?
        );
        return Ok(());
    }

    let context = build_context(&cli)?;

    eprintln!("{} termbridge MCP server on stdio", "🚀".green());
    eprintln!("{} Workspace: {}", "📁".cyan(), context.work_dir.display());
    eprintln!("{} Session logs: {}", "📝".cyan(), cli.log_dir.display());
    eprintln!(
        "{} Tools: {}",
        "🔧".cyan(),
        registry.get_tool_names().join(", ")
    );

    McpServer::new(registry, context).run().await
}
