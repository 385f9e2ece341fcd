//! termbridge application: CLI parsing, registry/context bootstrap, and the
//! MCP stdio server loop.

pub mod cli;
pub mod server;
pub mod setup;

pub use cli::Cli;
pub use server::McpServer;
pub use setup::{build_context, build_registry};
