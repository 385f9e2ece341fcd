//! Tool abstraction layer for termbridge
//!
//! Defines the `Tool` trait implemented by every remotely callable
//! operation, the parameter/result envelopes exchanged with the protocol
//! layer, the registry that dispatches calls by name, and the execution
//! context handed to each tool.

pub mod tool;
pub mod tool_context;
pub mod tool_registry;

pub use tool::{ParameterDefinition, Tool, ToolParameters, ToolResult};
pub use tool_context::ToolContext;
pub use tool_registry::ToolRegistry;

/// Build a `(name, ParameterDefinition)` pair for a tool parameter table.
///
/// ```
/// use std::collections::HashMap;
/// use termbridge_toolcore::{param, ParameterDefinition};
///
/// let params: HashMap<String, ParameterDefinition> = HashMap::from([
///     param!("pid", "integer", "Process ID", required),
///     param!("shell", "string", "Shell override", optional),
/// ]);
/// assert!(params["pid"].required);
/// assert!(!params["shell"].required);
/// ```
#[macro_export]
macro_rules! param {
    ($name:expr, $type:expr, $desc:expr, required) => {
        (
            $name.to_string(),
            $crate::ParameterDefinition {
                param_type: $type.to_string(),
                description: $desc.to_string(),
                required: true,
                default: None,
            },
        )
    };
    ($name:expr, $type:expr, $desc:expr, optional) => {
        (
            $name.to_string(),
            $crate::ParameterDefinition {
                param_type: $type.to_string(),
                description: $desc.to_string(),
                required: false,
                default: None,
            },
        )
    };
}
