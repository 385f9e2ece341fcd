//! Tool implementations for termbridge
//!
//! This crate contains the remotely callable operations exposed by the MCP
//! surface: the five session tools (start, read, interact, terminate, list)
//! and the two OS-scoped tools (process table, raw kill).

pub mod helpers;
pub mod process_tools;
pub mod system;

pub use process_tools::*;
pub use system::*;
