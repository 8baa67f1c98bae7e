//! General web search via the Tavily API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use ss_core::{Error, Result, SchemaBuilder, SchemaProperty, SearchConfig, Tool, ToolResult};

use crate::http::{ApiRequest, ApiResponse, HttpHelper};
use crate::params::{clamp_limit, InternetSearchParams, DEFAULT_LIMIT, EMPTY_QUERY};

/// Characters of page content kept per result
const CONTENT_PREVIEW_CHARS: usize = 500;

pub const SEARCH_UNAVAILABLE: &str = "Failed to perform internet search. Please try again later.";
pub const NO_RESULTS: &str = "No results found.";
pub const SEARCH_INTERNAL_ERROR: &str =
    "Failed to perform internet search due to an internal error.";

#[derive(Debug, Default, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Searches the web through Tavily
#[derive(Debug, Clone)]
pub struct InternetSearchTool {
    http: HttpHelper,
    api_base: String,
    api_key: String,
}

impl InternetSearchTool {
    pub fn new(http: HttpHelper, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from configuration; fails when no Tavily key is configured
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let api_key = config.require_tavily_key()?;
        Ok(Self::new(
            HttpHelper::from_config(config),
            config.tavily_api_base.clone(),
            api_key,
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.api_base.trim_end_matches('/'))
    }

    /// Run a web search and render the answer, results and follow-ups.
    /// Never fails; problems are reported in the returned text.
    pub async fn search(&self, query: &str, limit: u32, include_raw_content: bool) -> String {
        if query.trim().is_empty() {
            return EMPTY_QUERY.to_string();
        }
        let limit = clamp_limit(limit);

        info!(query = %query, limit, include_raw_content, "Searching the web");

        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "basic",
            "include_answer": true,
            "include_raw_content": include_raw_content,
            "include_images": false,
            "max_results": limit,
        });
        let request = ApiRequest::post_json(self.endpoint(), body)
            .header("Authorization", format!("Bearer {}", self.api_key));

        match format_search(self.http.send(request).await, limit as usize) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Error in internet_search");
                SEARCH_INTERNAL_ERROR.to_string()
            }
        }
    }
}

fn format_search(response: ApiResponse, limit: usize) -> Result<String> {
    let Some(doc) = response.into_document() else {
        return Ok(SEARCH_UNAVAILABLE.to_string());
    };
    let doc = doc
        .as_object()
        .ok_or_else(|| Error::ToolExecution("search response is not a JSON object".to_string()))?;

    let mut blocks = Vec::new();

    if let Some(answer) = doc
        .get("answer")
        .and_then(Value::as_str)
        .filter(|a| !a.trim().is_empty())
    {
        blocks.push(format!("Quick Answer: {}", answer));
    }

    if let Some(results) = doc.get("results").and_then(Value::as_array) {
        let mut position = 0;
        for (idx, entry) in results.iter().take(limit).enumerate() {
            match serde_json::from_value::<TavilyResult>(entry.clone()) {
                Ok(result) => {
                    position += 1;
                    blocks.push(format_result(position, &result));
                }
                Err(e) => warn!(index = idx, error = %e, "Skipping malformed search result"),
            }
        }
    }

    let questions: Vec<&str> = doc
        .get("follow_up_questions")
        .and_then(Value::as_array)
        .map(|qs| qs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !questions.is_empty() {
        let mut block = String::from("Suggested follow-up questions:");
        for question in questions {
            block.push_str("\n- ");
            block.push_str(question);
        }
        blocks.push(block);
    }

    if blocks.is_empty() {
        info!("Web search returned nothing to show");
        return Ok(NO_RESULTS.to_string());
    }

    Ok(blocks.join("\n\n"))
}

fn format_result(position: usize, result: &TavilyResult) -> String {
    let mut block = format!(
        "{}. {}\n   URL: {}",
        position,
        result.title.as_deref().unwrap_or("No title"),
        result.url.as_deref().unwrap_or("No URL"),
    );
    if let Some(content) = result.content.as_deref().filter(|c| !c.is_empty()) {
        block.push_str("\n   Content: ");
        block.push_str(preview(content, CONTENT_PREVIEW_CHARS));
        block.push_str("...");
    }
    block
}

/// First `max_chars` characters of `text`, on a char boundary
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[async_trait]
impl Tool for InternetSearchTool {
    fn name(&self) -> &str {
        "internet_search"
    }

    fn description(&self) -> &str {
        "Search the internet for current information. Returns a quick answer when available, the top results and suggested follow-up questions."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema(vec![
            SchemaProperty::required("query", "string", "Search terms"),
            SchemaProperty::optional(
                "limit",
                "integer",
                "Maximum number of results to return (1-20)",
                json!(DEFAULT_LIMIT),
            ),
            SchemaProperty::optional(
                "include_raw_content",
                "boolean",
                "Ask for raw page content",
                json!(false),
            ),
        ])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let params: InternetSearchParams = serde_json::from_value(input)
            .map_err(|e| Error::ToolExecution(format!("Invalid input parameters: {}", e)))?;

        let output = self
            .search(&params.query, params.limit, params.include_raw_content)
            .await;
        Ok(ToolResult::success(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool_for(server: &MockServer) -> InternetSearchTool {
        InternetSearchTool::new(
            HttpHelper::new("search-app/1.0", Duration::from_secs(5)),
            server.uri(),
            "tvly-test",
        )
    }

    async fn mount_json(server: &MockServer, body: Value) {
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_request_body_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-test"))
            .and(body_partial_json(json!({
                "api_key": "tvly-test",
                "query": "rust",
                "search_depth": "basic",
                "include_answer": true,
                "include_raw_content": true,
                "include_images": false,
                "max_results": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "yes"})))
            .expect(1)
            .mount(&server)
            .await;

        let out = tool_for(&server).search("rust", 5, true).await;
        assert_eq!(out, "Quick Answer: yes");
    }

    #[tokio::test]
    async fn test_full_output_layout() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            json!({
                "answer": "Rust is a language.",
                "results": [
                    {"title": "Rust", "url": "https://rust-lang.org", "content": "Fast."},
                    {"url": "https://example.com"}
                ],
                "follow_up_questions": ["Who made Rust?", "Is it safe?"]
            }),
        )
        .await;

        let out = tool_for(&server).search("rust", 3, false).await;

        assert_eq!(
            out,
            "Quick Answer: Rust is a language.\n\n\
             1. Rust\n   URL: https://rust-lang.org\n   Content: Fast....\n\n\
             2. No title\n   URL: https://example.com\n\n\
             Suggested follow-up questions:\n- Who made Rust?\n- Is it safe?"
        );
    }

    #[tokio::test]
    async fn test_content_truncated_to_500_chars() {
        let server = MockServer::start().await;
        let long = "é".repeat(600);
        mount_json(
            &server,
            json!({"results": [{"title": "T", "url": "u", "content": long}]}),
        )
        .await;

        let out = tool_for(&server).search("long", 3, false).await;
        let content = out.split("Content: ").nth(1).unwrap();

        assert!(content.ends_with("..."));
        assert_eq!(content.trim_end_matches("...").chars().count(), 500);
    }

    #[tokio::test]
    async fn test_limit_applies_to_results() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            json!({"results": [
                {"title": "A", "url": "a"},
                {"title": "B", "url": "b"},
                {"title": "C", "url": "c"}
            ]}),
        )
        .await;

        let out = tool_for(&server).search("abc", 2, false).await;
        assert!(out.contains("2. B"));
        assert!(!out.contains("3. C"));
    }

    #[tokio::test]
    async fn test_empty_document_is_no_results() {
        let server = MockServer::start().await;
        mount_json(&server, json!({"answer": "", "results": []})).await;

        assert_eq!(tool_for(&server).search("x", 3, false).await, NO_RESULTS);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            json!({"results": ["garbage", {"title": "Good", "url": "g"}]}),
        )
        .await;

        let out = tool_for(&server).search("x", 3, false).await;
        assert_eq!(out, "1. Good\n   URL: g");
    }

    #[tokio::test]
    async fn test_non_object_document_is_internal_error() {
        let server = MockServer::start().await;
        mount_json(&server, json!(["not", "an", "object"])).await;

        assert_eq!(
            tool_for(&server).search("x", 3, false).await,
            SEARCH_INTERNAL_ERROR
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_retry_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert_eq!(
            tool_for(&server).search("x", 3, false).await,
            SEARCH_UNAVAILABLE
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(InternetSearchTool::from_config(&SearchConfig::default()).is_err());

        let config = SearchConfig {
            tavily_api_key: "tvly-abc".to_string(),
            ..SearchConfig::default()
        };
        let tool = InternetSearchTool::from_config(&config).unwrap();
        assert_eq!(tool.endpoint(), "https://api.tavily.com/search");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("ab", 3), "ab");
    }
}
