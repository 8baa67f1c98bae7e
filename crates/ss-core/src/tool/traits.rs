//! Tool trait definition
//!
//! The seam between the agent and anything it can call: in-process search
//! tools and tools proxied from an MCP server both implement [`Tool`].

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::Result;

/// Tool execution result
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Output text handed back to the model
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// A named operation the agent can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised to the model
    fn name(&self) -> &str;

    /// Description shown to the model when it selects tools
    fn description(&self) -> &str;

    /// JSON schema for the tool's input parameters
    fn input_schema(&self) -> JsonValue;

    /// Execute the tool with the given JSON input
    async fn execute(&self, input: JsonValue) -> Result<ToolResult>;
}
