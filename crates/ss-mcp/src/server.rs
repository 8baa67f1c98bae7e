//! MCP tool server
//!
//! Serves `wiki_search`, `internet_search` and `yahoo_finance_search` over
//! stdio. Every call returns a single text block; failures are reported in
//! that text, never as MCP errors.

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::io::stdio,
};
use tracing::info;

use ss_core::{Error, SearchConfig};
use ss_tools::{FinanceParams, InternetSearchParams, SearchTools, WikiSearchParams};

/// Name announced to connecting clients
pub const SERVER_NAME: &str = "search-services";

const INSTRUCTIONS: &str = "Search tools: wiki_search looks up Wikipedia articles, \
internet_search searches the web, yahoo_finance_search returns the latest quote for a stock symbol.";

#[derive(Clone)]
pub struct SearchServer {
    tools: SearchTools,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SearchServer {
    pub fn new(tools: SearchTools) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }

    /// Build the server; fails when no Tavily key is configured
    pub fn from_config(config: &SearchConfig) -> ss_core::Result<Self> {
        Ok(Self::new(SearchTools::from_config(config)?))
    }

    #[tool(description = "Search Wikipedia for articles matching a query. Returns titles, summaries and article URLs.")]
    async fn wiki_search(
        &self,
        params: Parameters<WikiSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let text = self.tools.wiki.search(&params.query, params.limit).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Search the internet for current information. Returns a quick answer when available, the top results and suggested follow-up questions.")]
    async fn internet_search(
        &self,
        params: Parameters<InternetSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let text = self
            .tools
            .internet
            .search(&params.query, params.limit, params.include_raw_content)
            .await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Get the current price and latest trading day for a stock ticker symbol.")]
    async fn yahoo_finance_search(
        &self,
        params: Parameters<FinanceParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let text = self.tools.finance.quote(&params.symbol, &params.period).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.into();
        info.server_info.version = env!("CARGO_PKG_VERSION").into();
        info.instructions = Some(INSTRUCTIONS.into());
        info
    }
}

/// Run the tool server on stdin/stdout until the client disconnects
pub async fn serve_stdio(config: &SearchConfig) -> ss_core::Result<()> {
    let server = SearchServer::from_config(config)?;

    info!(name = SERVER_NAME, "Starting MCP tool server on stdio");

    let service = server
        .serve(stdio())
        .await
        .map_err(|e| Error::Mcp(format!("Failed to start MCP server: {}", e)))?;

    let reason = service
        .waiting()
        .await
        .map_err(|e| Error::Mcp(format!("MCP server error: {}", e)))?;

    info!(?reason, "MCP tool server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use serde_json::json;
    use ss_tools::{HttpHelper, InternetSearchTool, WikiSearchTool, YahooFinanceTool};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_for(mock: &MockServer) -> SearchServer {
        let http = HttpHelper::new("search-app/1.0", Duration::from_secs(5));
        SearchServer::new(SearchTools {
            wiki: Arc::new(WikiSearchTool::new(http.clone(), format!("{}/w/api.php", mock.uri()))),
            internet: Arc::new(InternetSearchTool::new(http.clone(), mock.uri(), "tvly-test")),
            finance: Arc::new(YahooFinanceTool::new(http, format!("{}/chart/", mock.uri()))),
        })
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_server_info() {
        let config = SearchConfig {
            tavily_api_key: "tvly-test".to_string(),
            ..SearchConfig::default()
        };
        let info = SearchServer::from_config(&config).unwrap().get_info();

        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some());
    }

    #[test]
    fn test_requires_tavily_key() {
        assert!(SearchServer::from_config(&SearchConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_router_lists_three_tools() {
        let mock = MockServer::start().await;
        let server = server_for(&mock);

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec!["internet_search", "wiki_search", "yahoo_finance_search"]);
    }

    #[tokio::test]
    async fn test_wiki_search_returns_text() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {"search": []}})))
            .mount(&mock)
            .await;

        let result = server_for(&mock)
            .wiki_search(Parameters(WikiSearchParams {
                query: "nothing".to_string(),
                limit: 3,
            }))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "No Wikipedia articles found for your query.");
    }

    #[tokio::test]
    async fn test_failures_are_text_not_errors() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock)
            .await;

        let server = server_for(&mock);
        let web = server
            .internet_search(Parameters(InternetSearchParams {
                query: "rust".to_string(),
                limit: 3,
                include_raw_content: false,
            }))
            .await
            .unwrap();
        assert_eq!(
            text_of(&web),
            "Failed to perform internet search. Please try again later."
        );

        let quote = server
            .yahoo_finance_search(Parameters(FinanceParams {
                symbol: "ABC".to_string(),
                period: "2w".to_string(),
            }))
            .await
            .unwrap();
        assert!(text_of(&quote).starts_with("Invalid period."));
    }
}
