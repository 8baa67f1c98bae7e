//! Input parameters shared by the tool implementations and the MCP server

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Results returned when the caller gives no limit
pub const DEFAULT_LIMIT: u32 = 3;

/// Upper bound for any result limit
pub const MAX_LIMIT: u32 = 20;

/// Period used when the caller gives none
pub const DEFAULT_PERIOD: &str = "1mo";

/// Returned by the search tools for a blank query
pub const EMPTY_QUERY: &str = "Query cannot be empty.";

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

/// Clamp a requested result count into `1..=MAX_LIMIT`
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WikiSearchParams {
    /// Search terms
    pub query: String,
    /// Maximum number of articles to return (1-20, default 3)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InternetSearchParams {
    /// Search terms
    pub query: String,
    /// Maximum number of results to return (1-20, default 3)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Ask the search provider for raw page content
    #[serde(default)]
    pub include_raw_content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinanceParams {
    /// Ticker symbol, e.g. AAPL
    pub symbol: String,
    /// Chart range: 1d, 5d, 1mo, 3mo, 6mo, 1y or 5y (default 1mo)
    #[serde(default = "default_period")]
    pub period: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(3), 3);
        assert_eq!(clamp_limit(500), MAX_LIMIT);
    }

    #[test]
    fn test_defaults_applied() {
        let wiki: WikiSearchParams = serde_json::from_value(json!({"query": "rust"})).unwrap();
        assert_eq!(wiki.limit, DEFAULT_LIMIT);

        let web: InternetSearchParams = serde_json::from_value(json!({"query": "rust"})).unwrap();
        assert!(!web.include_raw_content);

        let finance: FinanceParams = serde_json::from_value(json!({"symbol": "AAPL"})).unwrap();
        assert_eq!(finance.period, "1mo");
    }

    #[test]
    fn test_missing_query_rejected() {
        assert!(serde_json::from_value::<WikiSearchParams>(json!({"limit": 2})).is_err());
    }
}
