//! Newline-delimited JSON-RPC 2.0 loop over stdio.
//!
//! Handles `initialize`, `tools/list`, and `tools/call`; every tool-level
//! failure becomes an `isError` text result, so a bad call never takes the
//! server down. Requests without an id are notifications and get no reply.

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use termbridge_toolcore::{ToolContext, ToolParameters, ToolRegistry};

pub struct McpServer {
    registry: ToolRegistry,
    context: ToolContext,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        Self { registry, context }
    }

    /// Serve requests from stdin until it closes
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Some(json!({
                    "jsonrpc": "2.0",
                    "id": Value::Null,
                    "error": { "code": -32700, "message": format!("Parse error: {}", e) },
                })),
            };

            if let Some(response) = response {
                let mut payload = serde_json::to_string(&response)?;
                payload.push('\n');
                stdout.write_all(payload.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Dispatch one request. Notifications (no id) return `None`.
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let id = request.get("id").cloned()?;
        let params = request.get("params").cloned().unwrap_or(json!({}));

        let result = match method {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.tool_definitions() })),
            "tools/call" => self.handle_tools_call(&params).await,
            _ => Err(anyhow!("Unknown method: {}", method)),
        };

        Some(match result {
            Ok(value) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": value,
            }),
            Err(e) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32000, "message": e.to_string() },
            }),
        })
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "termbridge",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| anyhow!("Missing tool name"))?;
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = self
            .registry
            .execute_tool(name, ToolParameters::from_value(args), &self.context)
            .await;

        Ok(json!({
            "content": [{ "type": "text", "text": result.text() }],
            "isError": !result.success,
        }))
    }
}
