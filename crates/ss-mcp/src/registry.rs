//! Registry of connected MCP servers

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use ss_core::{Result, Tool, ToolManager};

use crate::{McpClient, McpConfig, McpToolAdapter};

/// Owns every live MCP session opened by the client
pub struct McpRegistry {
    clients: Vec<Arc<McpClient>>,
}

impl Default for McpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl McpRegistry {
    /// A registry with no sessions
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
        }
    }

    /// Connect every enabled server and register its tools.
    ///
    /// Servers that fail to start or list their tools are logged and
    /// skipped. Returns `None` when nothing connected.
    pub async fn initialize(
        config: &McpConfig,
        tool_manager: &mut ToolManager,
    ) -> Result<Option<Self>> {
        let enabled_servers = config.enabled_servers();

        if enabled_servers.is_empty() {
            info!("No MCP servers configured");
            return Ok(None);
        }

        let mut registry = Self::new();
        let mut total_tools = 0;

        for (name, server_config) in enabled_servers {
            info!(server_name = name, command = %server_config.command, "Connecting to MCP server");

            let client = match McpClient::connect(name, server_config).await {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    warn!(server_name = name, error = %e, "Skipping MCP server due to connection error");
                    continue;
                }
            };

            let tools = match client.list_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    warn!(server_name = name, error = %e, "Failed to list tools from MCP server");
                    registry.clients.push(client);
                    continue;
                }
            };

            info!(server_name = name, tool_count = tools.len(), "Discovered MCP tools");
            total_tools += tools.len();

            for tool in tools {
                let adapter = McpToolAdapter::new(Arc::clone(&client), tool);
                info!(server_name = name, tool_name = adapter.name(), "Registered MCP tool");
                tool_manager.register(Arc::new(adapter));
            }

            registry.clients.push(client);
        }

        if registry.clients.is_empty() {
            warn!("No MCP servers connected successfully");
            return Ok(None);
        }

        info!(
            server_count = registry.clients.len(),
            total_tools, "MCP registry initialized"
        );
        Ok(Some(registry))
    }

    /// Close every session. Consumes the registry, so this can only run
    /// once. Tool adapters must be dropped first or their sessions are
    /// left to close when the last adapter goes away.
    pub async fn close_all_sessions(self) {
        info!(session_count = self.clients.len(), "Closing MCP sessions");

        for client in self.clients {
            match Arc::try_unwrap(client) {
                Ok(client) => {
                    let name = client.server_name().to_string();
                    if let Err(e) = client.shutdown().await {
                        warn!(server_name = %name, error = %e, "Failed to close MCP session");
                    }
                }
                Err(client) => {
                    warn!(
                        server_name = client.server_name(),
                        "MCP session still referenced, skipping graceful close"
                    );
                }
            }
        }
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.clients.len()
    }

    /// Names of the connected servers
    pub fn server_names(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.server_name()).collect()
    }
}

/// Load the MCP configuration and connect its servers.
///
/// `MCP_CONFIG` wins over the file. A missing file is not an error; it
/// yields `Ok(None)` so the caller can fall back to another setup.
pub async fn initialize_mcp_tools(
    config_path: &Path,
    tool_manager: &mut ToolManager,
) -> Result<Option<McpRegistry>> {
    let mcp_config = if std::env::var_os(crate::config::MCP_CONFIG_ENV).is_some() {
        info!("Loading MCP configuration from environment");
        McpConfig::from_env()?
    } else if config_path.exists() {
        info!(path = %config_path.display(), "Loading MCP configuration from file");
        McpConfig::from_file(config_path)?
    } else {
        info!(path = %config_path.display(), "MCP configuration file not found");
        return Ok(None);
    };

    McpRegistry::initialize(&mcp_config, tool_manager).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::McpServerConfig;

    #[tokio::test]
    async fn test_empty_config_yields_none() {
        let mut manager = ToolManager::new();
        let registry = McpRegistry::initialize(&McpConfig::new(), &mut manager)
            .await
            .unwrap();

        assert!(registry.is_none());
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_servers_are_skipped() {
        let mut config = McpConfig::new();
        config.add_server("broken", McpServerConfig::new("/nonexistent/server", vec![]));
        let mut disabled = McpServerConfig::new("also-missing", vec![]);
        disabled.enabled = false;
        config.add_server("off", disabled);

        let mut manager = ToolManager::new();
        let registry = McpRegistry::initialize(&config, &mut manager).await.unwrap();

        assert!(registry.is_none());
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_close_empty_registry() {
        let registry = McpRegistry::new();
        assert_eq!(registry.session_count(), 0);
        assert!(registry.server_names().is_empty());
        registry.close_all_sessions().await;
    }

    #[tokio::test]
    async fn test_missing_config_file_yields_none() {
        if std::env::var_os(crate::config::MCP_CONFIG_ENV).is_some() {
            return;
        }
        let mut manager = ToolManager::new();
        let registry = initialize_mcp_tools(Path::new("/nonexistent/tools.json"), &mut manager)
            .await
            .unwrap();
        assert!(registry.is_none());
    }
}
