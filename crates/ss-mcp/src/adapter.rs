//! Adapter exposing a remote MCP tool through the [`Tool`] trait

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use ss_core::{Result, Tool, ToolResult};

use crate::client::{McpClient, McpTool};

/// A tool served by an MCP server, callable like a local tool
pub struct McpToolAdapter {
    client: Arc<McpClient>,
    tool: McpTool,
}

impl McpToolAdapter {
    pub fn new(client: Arc<McpClient>, tool: McpTool) -> Self {
        Self { client, tool }
    }

    /// Name of the server this tool lives on
    pub fn server_name(&self) -> &str {
        self.client.server_name()
    }
}

#[async_trait]
impl Tool for McpToolAdapter {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn description(&self) -> &str {
        &self.tool.description
    }

    fn input_schema(&self) -> JsonValue {
        self.tool.input_schema.clone()
    }

    async fn execute(&self, input: JsonValue) -> Result<ToolResult> {
        match self.client.call_tool(&self.tool.name, input).await {
            Ok(output) => Ok(ToolResult::success(output)),
            Err(e) => Ok(ToolResult::error(e.to_string())),
        }
    }
}
