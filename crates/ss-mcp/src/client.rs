//! MCP client
//!
//! Spawns an MCP server as a child process and talks to it over stdio.

use rmcp::{
    model::{CallToolRequestParams, RawContent, Tool},
    service::{RoleClient, RunningService, ServiceExt},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::Value as JsonValue;
use tokio::process::Command;
use tracing::debug;

use ss_core::{Error, Result};

use crate::config::McpServerConfig;

/// Log filter handed to child servers that do not set their own
const CHILD_LOG_FILTER: &str = "warn";

/// Remote tool description
#[derive(Debug, Clone, PartialEq)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

impl From<Tool> for McpTool {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.clone().unwrap_or_default().to_string(),
            input_schema: serde_json::to_value(&tool.input_schema).unwrap_or(JsonValue::Null),
        }
    }
}

/// Join the text blocks of a tool result
fn text_output(content: Vec<rmcp::model::Content>) -> String {
    content
        .into_iter()
        .filter_map(|c| match c.raw {
            RawContent::Text(text) => Some(text.text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A live session with one MCP server
pub struct McpClient {
    service: RunningService<RoleClient, ()>,
    name: String,
}

impl McpClient {
    /// Spawn the configured server and perform the MCP handshake
    pub async fn connect(name: &str, config: &McpServerConfig) -> Result<Self> {
        if config.command.trim().is_empty() {
            return Err(Error::Config(format!("Empty command for MCP server '{}'", name)));
        }

        let transport = TokioChildProcess::new(Command::new(&config.command).configure(|c| {
            c.args(&config.args);
            if !config.env.contains_key("RUST_LOG") {
                c.env("RUST_LOG", CHILD_LOG_FILTER);
            }
            c.envs(&config.env);
        }))
        .map_err(|e| Error::Mcp(format!("Failed to spawn '{}': {}", config.command, e)))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| Error::Mcp(format!("Failed to connect to '{}': {}", name, e)))?;

        if let Some(info) = service.peer_info() {
            debug!(
                server = name,
                remote_name = %info.server_info.name,
                remote_version = %info.server_info.version,
                "MCP handshake complete"
            );
        }

        Ok(Self {
            service,
            name: name.to_string(),
        })
    }

    /// Name this server has in the configuration
    pub fn server_name(&self) -> &str {
        &self.name
    }

    /// List available tools from the MCP server
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let result = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|e| Error::Mcp(format!("Failed to list tools: {}", e)))?;

        Ok(result.tools.into_iter().map(McpTool::from).collect())
    }

    /// Call a tool and return its text output. A result flagged as an
    /// error comes back as [`Error::Mcp`] carrying that text.
    pub async fn call_tool(&self, name: &str, args: JsonValue) -> Result<String> {
        let result = self
            .service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: args.as_object().cloned(),
                task: None,
            })
            .await
            .map_err(|e| Error::Mcp(format!("Tool call failed: {}", e)))?;

        let is_error = result.is_error.unwrap_or(false);
        let output = text_output(result.content);

        if is_error {
            return Err(Error::Mcp(output));
        }
        Ok(output)
    }

    /// Close the session and stop the child process
    pub async fn shutdown(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| Error::Mcp(format!("Shutdown failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn test_text_output_joins_text_blocks() {
        let content = vec![Content::text("first"), Content::text("second")];
        assert_eq!(text_output(content), "first\nsecond");
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let config = McpServerConfig::new("  ", vec![]);
        let err = McpClient::connect("blank", &config).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_mcp_error() {
        let config = McpServerConfig::new("/nonexistent/search-services", vec![]);
        let err = McpClient::connect("missing", &config).await.err().unwrap();
        assert!(matches!(err, Error::Mcp(_)));
    }
}
