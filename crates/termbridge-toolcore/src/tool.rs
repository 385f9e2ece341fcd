use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool_context::ToolContext;

/// Declared shape of one tool parameter, used to generate the protocol-facing
/// input schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub param_type: String,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

/// Named arguments of one tool call
#[derive(Debug, Clone, Default)]
pub struct ToolParameters {
    pub data: HashMap<String, Value>,
}

impl ToolParameters {
    pub fn from_value(value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self { data }
    }

    /// Fetch a required parameter, failing when absent or mistyped
    pub fn get_required<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| anyhow!("Missing required parameter '{}'", key))?;
        serde_json::from_value(value.clone())
            .map_err(|e| anyhow!("Invalid value for parameter '{}': {}", key, e))
    }

    /// Fetch an optional parameter; absent keys are `Ok(None)`, present but
    /// mistyped values are an error
    pub fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| anyhow!("Invalid value for parameter '{}': {}", key, e)),
        }
    }
}

/// Outcome of one tool call, as handed back to the protocol layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(content: String) -> Self {
        Self {
            success: true,
            content,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: Some(message),
        }
    }

    /// The text payload a caller sees: content on success, the error
    /// message otherwise
    pub fn text(&self) -> &str {
        match &self.error {
            Some(e) if !self.success => e,
            _ => &self.content,
        }
    }
}

/// A remotely callable operation
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> HashMap<String, ParameterDefinition>;

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult;
}
