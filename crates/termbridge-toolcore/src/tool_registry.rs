use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::tool::{Tool, ToolParameters, ToolResult};
use crate::tool_context::ToolContext;

/// Name-indexed collection of tools; the single dispatch point for the
/// protocol layer
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool; a later registration under the same name wins
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn get_all_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.values().cloned().collect()
    }

    pub fn get_tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a tool by name. An unknown name is a failed result, not a
    /// panic or an Err; the protocol layer forwards it as error text.
    pub async fn execute_tool(
        &self,
        name: &str,
        params: ToolParameters,
        context: &ToolContext,
    ) -> ToolResult {
        match self.get_tool(name) {
            Some(tool) => tool.execute(params, context).await,
            None => ToolResult::error(format!("Tool '{}' not found", name)),
        }
    }

    /// Tool definitions in the wire format served by `tools/list`:
    /// name, description, and a JSON-schema object built from each tool's
    /// declared parameters
    pub fn tool_definitions(&self) -> Vec<Value> {
        let mut definitions: Vec<Value> = Vec::with_capacity(self.tools.len());
        for name in self.get_tool_names() {
            let tool = &self.tools[&name];
            let mut properties = serde_json::Map::new();
            let mut required: Vec<String> = Vec::new();

            let mut params: Vec<_> = tool.parameters().into_iter().collect();
            params.sort_by(|a, b| a.0.cmp(&b.0));
            for (param_name, def) in params {
                let mut schema = serde_json::Map::new();
                schema.insert("type".to_string(), json!(def.param_type));
                schema.insert("description".to_string(), json!(def.description));
                if let Some(default) = def.default {
                    schema.insert("default".to_string(), default);
                }
                if def.required {
                    required.push(param_name.clone());
                }
                properties.insert(param_name, Value::Object(schema));
            }

            definitions.push(json!({
                "name": tool.name(),
                "description": tool.description(),
                "inputSchema": {
                    "type": "object",
                    "properties": Value::Object(properties),
                    "required": required,
                },
            }));
        }
        definitions
    }
}
