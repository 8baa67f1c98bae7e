//! Configuration management
//!
//! Settings are resolved in this order (later wins):
//! 1. Defaults
//! 2. `search-services.toml` in the working directory
//! 3. Environment variables
//! 4. The JSON key file (`keys.json`), for keys still unset after step 3
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default TOML configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "search-services.toml";

/// Default JSON key file name
pub const DEFAULT_KEYS_FILE: &str = "keys.json";

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API
    Claude,
    /// OpenAI-compatible chat completions (Groq, OpenAI, ...)
    #[default]
    OpenAi,
}

impl LlmProvider {
    /// Parse a provider name. Anything that is not Anthropic is treated as
    /// OpenAI-compatible.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Self::Claude,
            _ => Self::OpenAi,
        }
    }

    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Claude => "https://api.anthropic.com/v1",
            Self::OpenAi => "https://api.groq.com/openai/v1",
        }
    }
}

/// Upstream search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Tavily API key (required by the tool server)
    #[serde(skip_serializing)]
    pub tavily_api_key: String,

    /// User-Agent sent with every outbound request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Wikipedia API endpoint
    pub wiki_api_base: String,

    /// Tavily API base URL
    pub tavily_api_base: String,

    /// Yahoo Finance chart API base URL (symbol is appended)
    pub finance_api_base: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: String::new(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            wiki_api_base: "https://en.wikipedia.org/w/api.php".to_string(),
            tavily_api_base: "https://api.tavily.com".to_string(),
            finance_api_base: "https://query1.finance.yahoo.com/v8/finance/chart/".to_string(),
        }
    }
}

impl SearchConfig {
    /// Return the Tavily key, or a configuration error if it is missing
    pub fn require_tavily_key(&self) -> crate::Result<&str> {
        let key = self.tavily_api_key.trim();
        if key.is_empty() {
            return Err(Error::Config(
                "TAVILY_API key not set (keys file or TAVILY_API_KEY)".to_string(),
            ));
        }
        Ok(key)
    }
}

fn default_user_agent() -> String {
    "search-app/1.0".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::OpenAi,
            base_url: None,
        }
    }
}

impl LlmConfig {
    /// Return the API key, or a configuration error if it is missing
    pub fn require_api_key(&self) -> crate::Result<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(Error::Config(
                "LLM API key not set (GROQ_API in keys file, or LLM_API_KEY)".to_string(),
            ));
        }
        Ok(key)
    }

    /// Effective base URL
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

fn default_model() -> String {
    "qwen-qwq-32b".to_string()
}

/// MCP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Path to the MCP server list (JSON)
    pub config_path: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            config_path: "tools.json".to_string(),
        }
    }
}

/// Conversational agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum LLM round trips per user turn
    pub max_steps: usize,

    /// Keep conversation history between turns
    pub memory_enabled: bool,

    /// System prompt sent with every request
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 15,
            memory_enabled: true,
            system_prompt: "You are a helpful assistant with access to Wikipedia search, \
                internet search and Yahoo Finance tools. Use them when the user asks \
                about facts, current events or stock prices."
                .to_string(),
        }
    }
}

/// Main configuration for search-services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream search API settings
    #[serde(default)]
    pub search: SearchConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// MCP client configuration
    #[serde(default)]
    pub mcp: McpConfig,

    /// Agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Path to the JSON key file
    #[serde(default = "default_keys_path")]
    pub keys_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            llm: LlmConfig::default(),
            mcp: McpConfig::default(),
            agent: AgentConfig::default(),
            keys_path: default_keys_path(),
        }
    }
}

fn default_keys_path() -> String {
    DEFAULT_KEYS_FILE.to_string()
}

/// Contents of the JSON key file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Keys {
    #[serde(rename = "TAVILY_API", default)]
    pub tavily_api: Option<String>,

    #[serde(rename = "GROQ_API", default)]
    pub groq_api: Option<String>,
}

impl Keys {
    /// Read a key file such as `{"TAVILY_API": "...", "GROQ_API": "..."}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read key file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid key file {}: {}", path.display(), e))
        })
    }
}

impl Config {
    /// Replace `${VAR_NAME}` with the value of the environment variable.
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment
    /// overrides and the key file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut cfg = Self::from_toml_config(config);
        cfg.apply_env_overrides();
        cfg.apply_keys_file()?;

        Ok(cfg)
    }

    /// Load from `search-services.toml` if present, otherwise from the
    /// environment and key file only.
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Defaults plus environment overrides plus the key file
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.apply_keys_file()?;
        Ok(cfg)
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let defaults = Self::default();

        let search = toml.search.unwrap_or_default();
        let search_config = SearchConfig {
            tavily_api_key: search.tavily_api_key.unwrap_or_default(),
            user_agent: search.user_agent.unwrap_or(defaults.search.user_agent),
            request_timeout_secs: search
                .request_timeout_secs
                .unwrap_or(defaults.search.request_timeout_secs),
            wiki_api_base: search.wiki_api_base.unwrap_or(defaults.search.wiki_api_base),
            tavily_api_base: search
                .tavily_api_base
                .unwrap_or(defaults.search.tavily_api_base),
            finance_api_base: search
                .finance_api_base
                .unwrap_or(defaults.search.finance_api_base),
        };

        let llm = toml.llm.unwrap_or_default();
        let llm_config = LlmConfig {
            api_key: llm.api_key.unwrap_or_default(),
            model: llm.model.unwrap_or_else(default_model),
            provider: llm
                .provider
                .as_deref()
                .map(LlmProvider::parse)
                .unwrap_or_default(),
            base_url: llm.base_url,
        };

        let mcp = toml.mcp.unwrap_or_default();
        let mcp_config = McpConfig {
            config_path: mcp.config_path.unwrap_or(defaults.mcp.config_path),
        };

        let agent = toml.agent.unwrap_or_default();
        let agent_config = AgentConfig {
            max_steps: agent.max_steps.unwrap_or(defaults.agent.max_steps),
            memory_enabled: agent.memory_enabled.unwrap_or(defaults.agent.memory_enabled),
            system_prompt: agent.system_prompt.unwrap_or(defaults.agent.system_prompt),
        };

        Config {
            search: search_config,
            llm: llm_config,
            mcp: mcp_config,
            agent: agent_config,
            keys_path: toml.keys_path.unwrap_or_else(default_keys_path),
        }
    }

    /// Override settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env("KEYS_PATH") {
            self.keys_path = path;
        }

        if let Some(key) = non_empty_env("TAVILY_API_KEY") {
            self.search.tavily_api_key = key;
        }
        if let Some(secs) = non_empty_env("REQUEST_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.search.request_timeout_secs = secs;
        }

        if let Some(key) = non_empty_env("LLM_API_KEY").or_else(|| non_empty_env("GROQ_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(model) = non_empty_env("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(provider) = non_empty_env("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }
        if let Some(base_url) = non_empty_env("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }

        if let Some(path) = non_empty_env("MCP_CONFIG_PATH") {
            self.mcp.config_path = path;
        }

        if let Some(steps) = non_empty_env("AGENT_MAX_STEPS").and_then(|s| s.parse().ok()) {
            self.agent.max_steps = steps;
        }
    }

    /// Fill keys that are still empty from the JSON key file.
    /// A missing key file is not an error here; the component that needs a
    /// key reports it.
    fn apply_keys_file(&mut self) -> crate::Result<()> {
        if !Path::new(&self.keys_path).exists() {
            tracing::debug!(path = %self.keys_path, "Key file not found");
            return Ok(());
        }

        let keys = Keys::from_json_file(&self.keys_path)?;
        self.apply_keys(keys);
        Ok(())
    }

    fn apply_keys(&mut self, keys: Keys) {
        if self.search.tavily_api_key.is_empty() {
            if let Some(key) = keys.tavily_api {
                self.search.tavily_api_key = key;
            }
        }
        if self.llm.api_key.is_empty() {
            if let Some(key) = keys.groq_api {
                self.llm.api_key = key;
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    keys_path: Option<String>,
    search: Option<TomlSearchConfig>,
    llm: Option<TomlLlmConfig>,
    mcp: Option<TomlMcpConfig>,
    agent: Option<TomlAgentConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlSearchConfig {
    tavily_api_key: Option<String>,
    user_agent: Option<String>,
    request_timeout_secs: Option<u64>,
    wiki_api_base: Option<String>,
    tavily_api_base: Option<String>,
    finance_api_base: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    /// "claude" or "openai" (any OpenAI-compatible endpoint, e.g. Groq)
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlMcpConfig {
    config_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlAgentConfig {
    max_steps: Option<usize>,
    memory_enabled: Option<bool>,
    system_prompt: Option<String>,
}
