//! search-services: MCP search tool server and interactive client
//!
//! Usage:
//!   search-services                  - Run the MCP tool server on stdio
//!   search-services --chat           - Chat with an assistant that uses the tools over MCP
//!   search-services --chat --local   - Chat using the tools in-process
//!   search-services --help           - Show help

mod cli;

use std::path::Path;

use ss_core::{Agent, ChatAgent, Config, LlmClient, ToolManager};
use ss_mcp::{McpConfig, McpRegistry, McpServerConfig, initialize_mcp_tools};
use ss_tools::register_default_tools;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// MCP tool server on stdin/stdout
    Serve,
    /// Interactive chat client
    Chat { local: bool },
    Help,
    Version,
}

impl RunMode {
    fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "warn",
            _ => "info",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1));

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("search-services {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    dotenvy::dotenv().ok();

    // stdout carries the MCP protocol or the chat, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(mode.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    match mode {
        RunMode::Serve => run_server(config).await,
        RunMode::Chat { local } => run_chat(config, local).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments (program name already skipped)
fn parse_args<I>(args: I) -> RunMode
where
    I: IntoIterator<Item = String>,
{
    let mut chat = false;
    let mut local = false;

    for arg in args {
        match arg.as_str() {
            "--serve" | "-s" => return RunMode::Serve,
            "--chat" | "-c" => chat = true,
            "--local" => local = true,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    if chat {
        RunMode::Chat { local }
    } else {
        RunMode::Serve
    }
}

fn print_help() {
    println!("search-services - Wikipedia, web and stock quote tools over MCP");
    println!();
    println!("Usage:");
    println!("  search-services                Run the MCP tool server on stdio (default)");
    println!("  search-services --serve        Same as above");
    println!("  search-services --chat         Start the interactive client (tools over MCP)");
    println!("  search-services --chat --local Start the interactive client with in-process tools");
    println!("  search-services --help         Show this help message");
    println!("  search-services --version      Show version");
    println!();
    println!("Configuration:");
    println!("  search-services.toml  Optional settings file");
    println!("  keys.json             API keys: {{\"TAVILY_API\": \"...\", \"GROQ_API\": \"...\"}}");
    println!("  tools.json            MCP servers for --chat: {{\"mcpServers\": {{...}}}}");
    println!();
    println!("Environment Variables:");
    println!("  TAVILY_API_KEY        Tavily key (required by the server)");
    println!("  LLM_API_KEY           LLM key (GROQ_API_KEY also accepted)");
    println!("  LLM_MODEL             Model name (default: qwen-qwq-32b)");
    println!("  LLM_PROVIDER          Provider: openai or claude (default: openai)");
    println!("  LLM_BASE_URL          Custom API endpoint");
    println!("  KEYS_PATH             Path to the key file");
    println!("  MCP_CONFIG_PATH       Path to the MCP client config");
    println!("  MCP_CONFIG            Inline MCP client config (JSON)");
    println!("  AGENT_MAX_STEPS       Tool-use steps per turn (default: 15)");
    println!("  REQUEST_TIMEOUT_SECS  Upstream request timeout (default: 30)");
    println!("  RUST_LOG              Log filter (logs are written to stderr)");
}

/// Serve the search tools over MCP until the client disconnects
async fn run_server(config: Config) -> anyhow::Result<()> {
    config
        .search
        .require_tavily_key()
        .map_err(|e| anyhow::anyhow!("Cannot start the tool server: {}", e))?;

    ss_mcp::serve_stdio(&config.search)
        .await
        .map_err(|e| anyhow::anyhow!("Tool server failed: {}", e))
}

/// Interactive client. MCP sessions are closed once the loop ends,
/// however it ends.
async fn run_chat(config: Config, local: bool) -> anyhow::Result<()> {
    let client = LlmClient::new(&config.llm)
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;

    let mut tool_manager = ToolManager::new();
    let registry = if local {
        register_default_tools(&mut tool_manager, &config.search)?;
        None
    } else {
        connect_mcp_tools(&config, &mut tool_manager).await?
    };

    if tool_manager.is_empty() {
        tracing::warn!("No tools available; the assistant will answer without them");
    } else {
        tracing::info!(tools = ?tool_manager.tool_names(), "Tools ready");
    }

    let mut agent = ChatAgent::new(client, tool_manager, config.agent.clone());
    let result = cli::run_repl(&mut agent).await;

    finish_chat(agent, registry, result).await
}

/// Tear down a chat session and hand back how the loop ended. Adapters
/// hold the sessions, so the agent goes first.
async fn finish_chat<A: Agent>(
    agent: A,
    registry: Option<McpRegistry>,
    result: anyhow::Result<()>,
) -> anyhow::Result<()> {
    drop(agent);
    if let Some(registry) = registry {
        registry.close_all_sessions().await;
    }
    result
}

/// Connect the MCP servers named in the client config. Without any
/// config this binary is started in `--serve` mode as the only server.
async fn connect_mcp_tools(
    config: &Config,
    tool_manager: &mut ToolManager,
) -> anyhow::Result<Option<McpRegistry>> {
    let path = Path::new(&config.mcp.config_path);
    let configured = path.exists() || std::env::var_os(ss_mcp::config::MCP_CONFIG_ENV).is_some();

    if configured {
        return Ok(initialize_mcp_tools(path, tool_manager).await?);
    }

    tracing::info!(path = %path.display(), "No MCP client config, starting the bundled tool server");
    let exe = std::env::current_exe()?;
    let bundled = McpConfig::single(
        "search",
        McpServerConfig::new(exe.to_string_lossy(), vec!["--serve".to_string()]),
    );
    Ok(McpRegistry::initialize(&bundled, tool_manager).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn parse(args: &[&str]) -> RunMode {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse(&[]), RunMode::Serve);
        assert_eq!(parse(&["--serve"]), RunMode::Serve);
        assert_eq!(parse(&["-c"]), RunMode::Chat { local: false });
        assert_eq!(parse(&["--chat", "--local"]), RunMode::Chat { local: true });
        assert_eq!(parse(&["--local", "--chat"]), RunMode::Chat { local: true });
        assert_eq!(parse(&["-h"]), RunMode::Help);
        assert_eq!(parse(&["--version"]), RunMode::Version);
        assert_eq!(parse(&["--unknown"]), RunMode::Serve);
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    struct IdleAgent {
        _flag: DropFlag,
    }

    #[async_trait]
    impl Agent for IdleAgent {
        async fn run(&mut self, _task: &str) -> ss_core::Result<String> {
            Ok(String::new())
        }

        fn clear_conversation_history(&mut self) {}
    }

    #[tokio::test]
    async fn test_finish_chat_after_failed_loop() {
        let dropped = Arc::new(AtomicBool::new(false));
        let agent = IdleAgent {
            _flag: DropFlag(Arc::clone(&dropped)),
        };

        let result = finish_chat(
            agent,
            Some(McpRegistry::new()),
            Err(anyhow::anyhow!("terminal gone")),
        )
        .await;

        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(result.unwrap_err().to_string(), "terminal gone");
    }

    #[tokio::test]
    async fn test_finish_chat_without_registry() {
        let dropped = Arc::new(AtomicBool::new(false));
        let agent = IdleAgent {
            _flag: DropFlag(Arc::clone(&dropped)),
        };

        finish_chat(agent, None, Ok(())).await.unwrap();
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_log_filter_defaults() {
        assert_eq!(RunMode::Serve.default_log_filter(), "info");
        assert_eq!(RunMode::Chat { local: true }.default_log_filter(), "warn");
    }
}
