//! Wikipedia article search

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use ss_core::{Error, Result, SchemaBuilder, SchemaProperty, SearchConfig, Tool, ToolResult};

use crate::http::{ApiRequest, ApiResponse, HttpHelper};
use crate::params::{clamp_limit, WikiSearchParams, DEFAULT_LIMIT, EMPTY_QUERY};

const ARTICLE_BASE: &str = "https://en.wikipedia.org/wiki/";

pub const NO_ARTICLES: &str = "No Wikipedia articles found for your query.";
pub const WIKI_INTERNAL_ERROR: &str = "Failed to search Wikipedia due to an internal error.";

#[derive(Debug, Deserialize)]
struct WikiResponse {
    #[serde(default)]
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Option<Vec<WikiMatch>>,
}

#[derive(Debug, Deserialize)]
struct WikiMatch {
    title: String,
    snippet: String,
}

/// Searches the Wikipedia full-text index
#[derive(Debug, Clone)]
pub struct WikiSearchTool {
    http: HttpHelper,
    api_base: String,
}

impl WikiSearchTool {
    pub fn new(http: HttpHelper, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(HttpHelper::from_config(config), config.wiki_api_base.clone())
    }

    /// Search Wikipedia and render up to `limit` matches. Never fails;
    /// problems are reported in the returned text.
    pub async fn search(&self, query: &str, limit: u32) -> String {
        if query.trim().is_empty() {
            return EMPTY_QUERY.to_string();
        }
        let limit = clamp_limit(limit);

        info!(query = %query, limit, "Searching Wikipedia");

        let request = ApiRequest::get(&self.api_base)
            .query("action", "query")
            .query("list", "search")
            .query("srsearch", query)
            .query("format", "json")
            .query("srlimit", limit);

        match format_matches(self.http.send(request).await, limit as usize) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Error in wiki_search");
                WIKI_INTERNAL_ERROR.to_string()
            }
        }
    }
}

fn format_matches(response: ApiResponse, limit: usize) -> Result<String> {
    let Some(doc) = response.into_document() else {
        return Ok(NO_ARTICLES.to_string());
    };

    let parsed: WikiResponse = serde_json::from_value(doc)?;
    let matches = parsed
        .query
        .and_then(|q| q.search)
        .unwrap_or_default();

    if matches.is_empty() {
        info!("Wikipedia returned no matches");
        return Ok(NO_ARTICLES.to_string());
    }

    let blocks: Vec<String> = matches
        .iter()
        .take(limit)
        .map(|m| {
            format!(
                "Title: {}\nSummary: {}\nURL: {}",
                m.title,
                strip_highlight(&m.snippet),
                article_url(&m.title)
            )
        })
        .collect();

    Ok(blocks.join("\n\n"))
}

/// Remove the search-match highlight markup from a snippet
fn strip_highlight(snippet: &str) -> String {
    snippet
        .replace("<span class=\"searchmatch\">", "")
        .replace("</span>", "")
}

/// Article URL for a title: spaces become underscores, then percent-encoding
pub fn article_url(title: &str) -> String {
    let slug = title.replace(' ', "_");
    let encoded = urlencoding::encode(&slug).replace("%2F", "/");
    format!("{}{}", ARTICLE_BASE, encoded)
}

#[async_trait]
impl Tool for WikiSearchTool {
    fn name(&self) -> &str {
        "wiki_search"
    }

    fn description(&self) -> &str {
        "Search Wikipedia for articles matching a query. Returns titles, summaries and article URLs."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema(vec![
            SchemaProperty::required("query", "string", "Search terms"),
            SchemaProperty::optional(
                "limit",
                "integer",
                "Maximum number of articles to return (1-20)",
                json!(DEFAULT_LIMIT),
            ),
        ])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let params: WikiSearchParams = serde_json::from_value(input)
            .map_err(|e| Error::ToolExecution(format!("Invalid input parameters: {}", e)))?;

        Ok(ToolResult::success(self.search(&params.query, params.limit).await))
    }
}
