//! MCP client configuration
//!
//! Same shape as the usual `mcpServers` tool file:
//!
//! ```json
//! {"mcpServers": {"search": {"command": "search-services", "args": ["--serve"]}}}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ss_core::{Error, Result};

/// Environment variable holding an inline JSON configuration
pub const MCP_CONFIG_ENV: &str = "MCP_CONFIG";

/// How to launch one MCP server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpServerConfig {
    /// Executable to start
    pub command: String,

    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables to pass to the server
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Whether this server is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl McpServerConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
            enabled: true,
        }
    }
}

/// All MCP server definitions, keyed by server name
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub servers: BTreeMap<String, McpServerConfig>,
}

impl McpConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration with a single server
    pub fn single(name: impl Into<String>, server: McpServerConfig) -> Self {
        let mut config = Self::new();
        config.add_server(name, server);
        config
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read MCP config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid MCP config JSON: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read MCP config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid MCP config TOML: {}", e)))
    }

    /// Load a file, choosing the format by extension (`.toml` or JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            _ => Self::from_json_file(path),
        }
    }

    /// Load configuration from the `MCP_CONFIG` environment variable (JSON)
    pub fn from_env() -> Result<Self> {
        let config_json = std::env::var(MCP_CONFIG_ENV)
            .map_err(|_| Error::Config(format!("{} not set", MCP_CONFIG_ENV)))?;

        serde_json::from_str(&config_json)
            .map_err(|e| Error::Config(format!("Invalid {} JSON: {}", MCP_CONFIG_ENV, e)))
    }

    /// Enabled servers in name order
    pub fn enabled_servers(&self) -> Vec<(&str, &McpServerConfig)> {
        self.servers
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(name, s)| (name.as_str(), s))
            .collect()
    }

    /// Add or replace a server definition
    pub fn add_server(&mut self, name: impl Into<String>, server: McpServerConfig) {
        self.servers.insert(name.into(), server);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = McpConfig::new();
        assert!(config.servers.is_empty());
        assert!(config.enabled_servers().is_empty());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "mcpServers": {
                "search": {
                    "command": "search-services",
                    "args": ["--serve"],
                    "env": {"RUST_LOG": "debug"}
                },
                "disabled": {
                    "command": "other",
                    "enabled": false
                }
            }
        }"#;

        let config: McpConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.servers.len(), 2);

        let enabled = config.enabled_servers();
        assert_eq!(enabled.len(), 1);
        let (name, server) = enabled[0];
        assert_eq!(name, "search");
        assert_eq!(server.command, "search-services");
        assert_eq!(server.args, vec!["--serve"]);
        assert_eq!(server.env.get("RUST_LOG").map(String::as_str), Some("debug"));
    }

    #[test]
    fn test_from_files() {
        let mut json = NamedTempFile::with_suffix(".json").unwrap();
        write!(json, r#"{{"mcpServers": {{"a": {{"command": "x"}}}}}}"#).unwrap();
        let config = McpConfig::from_file(json.path()).unwrap();
        assert_eq!(config.servers["a"].command, "x");

        let mut toml = NamedTempFile::with_suffix(".toml").unwrap();
        write!(toml, "[mcpServers.b]\ncommand = \"y\"\nargs = [\"--serve\"]\n").unwrap();
        let config = McpConfig::from_file(toml.path()).unwrap();
        assert_eq!(config.servers["b"].args, vec!["--serve"]);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = McpConfig::from_json_file("/nonexistent/tools.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_single() {
        let config = McpConfig::single("search", McpServerConfig::new("bin", vec![]));
        assert_eq!(config.enabled_servers()[0].0, "search");
    }
}
