//! Equity quotes from the Yahoo Finance chart API

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use ss_core::{Error, Result, SchemaBuilder, SchemaProperty, SearchConfig, Tool, ToolResult};

use crate::http::{ApiRequest, ApiResponse, HttpHelper};
use crate::params::{FinanceParams, DEFAULT_PERIOD};

pub const EMPTY_SYMBOL: &str = "Symbol cannot be empty.";

/// Chart range accepted by the quote tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    OneDay,
    FiveDays,
    #[default]
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    FiveYears,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::FiveYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }

    /// Message listing every valid period
    pub fn invalid_message() -> String {
        let valid: Vec<&str> = Self::ALL.iter().map(Period::as_str).collect();
        format!("Invalid period. Must be one of: {}", valid.join(", "))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::ToolExecution(Self::invalid_message()))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    exchange_name: String,
    currency: String,
    regular_market_price: Value,
    chart_previous_close: Value,
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Value>,
    high: Vec<Value>,
    low: Vec<Value>,
    close: Vec<Value>,
    volume: Vec<Value>,
}

/// Fetches the latest trading day for a ticker symbol
#[derive(Debug, Clone)]
pub struct YahooFinanceTool {
    http: HttpHelper,
    api_base: String,
}

impl YahooFinanceTool {
    pub fn new(http: HttpHelper, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(HttpHelper::from_config(config), config.finance_api_base.clone())
    }

    /// Look up `symbol` over `period`. The period is validated before any
    /// request is made. Never fails; problems are reported in the text.
    pub async fn quote(&self, symbol: &str, period: &str) -> String {
        let period = match period.parse::<Period>() {
            Ok(period) => period,
            Err(_) => return Period::invalid_message(),
        };
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return EMPTY_SYMBOL.to_string();
        }

        info!(symbol = %symbol, period = %period, "Fetching finance data");

        let url = format!("{}{}", self.api_base, urlencoding::encode(symbol));
        let request = ApiRequest::get(url)
            .query("symbol", symbol)
            .query("range", period)
            .query("interval", "1d")
            .query("includePrePost", "false");

        match format_chart(self.http.send(request).await, symbol) {
            Ok(text) => text,
            Err(e) => {
                error!(symbol = %symbol, error = %e, "Error in yahoo_finance_search");
                format!(
                    "Failed to retrieve finance data for {} due to an internal error.",
                    symbol
                )
            }
        }
    }
}

fn format_chart(response: ApiResponse, symbol: &str) -> Result<String> {
    let unavailable = || format!("Could not retrieve data for symbol {}", symbol);

    let Some(doc) = response.into_document() else {
        return Ok(unavailable());
    };
    let Some(first) = doc
        .get("chart")
        .and_then(|chart| chart.get("result"))
        .and_then(Value::as_array)
        .and_then(|results| results.first())
    else {
        info!(symbol = %symbol, "No chart data returned");
        return Ok(unavailable());
    };

    let chart: ChartResult = serde_json::from_value(first.clone())?;
    let meta = &chart.meta;

    let timestamp = *chart
        .timestamp
        .last()
        .ok_or_else(|| Error::ToolExecution("chart has no timestamps".to_string()))?;
    let quote = chart
        .indicators
        .quote
        .first()
        .ok_or_else(|| Error::ToolExecution("chart has no quote indicators".to_string()))?;

    let local = timestamp
        .checked_add(meta.gmtoffset.unwrap_or(0))
        .ok_or_else(|| Error::ToolExecution(format!("timestamp out of range: {}", timestamp)))?;
    let date = DateTime::from_timestamp(local, 0)
        .ok_or_else(|| Error::ToolExecution(format!("timestamp out of range: {}", timestamp)))?
        .format("%Y-%m-%d");

    let lines = [
        format!("Stock: {} ({})", meta.symbol, meta.exchange_name),
        format!("Currency: {}", meta.currency),
        format!("Current Price: {}", display_value(&meta.regular_market_price)),
        format!("Previous Close: {}", display_value(&meta.chart_previous_close)),
        String::new(),
        "Latest Trading Day:".to_string(),
        format!("Date: {}", date),
        format!("Open: {}", last_value(&quote.open, "open")?),
        format!("High: {}", last_value(&quote.high, "high")?),
        format!("Low: {}", last_value(&quote.low, "low")?),
        format!("Close: {}", last_value(&quote.close, "close")?),
        format!("Volume: {}", last_value(&quote.volume, "volume")?),
    ];

    Ok(lines.join("\n"))
}

fn last_value(series: &[Value], name: &str) -> Result<String> {
    series
        .last()
        .map(display_value)
        .ok_or_else(|| Error::ToolExecution(format!("empty {} series", name)))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Tool for YahooFinanceTool {
    fn name(&self) -> &str {
        "yahoo_finance_search"
    }

    fn description(&self) -> &str {
        "Get the current price and latest trading day for a stock ticker symbol."
    }

    fn input_schema(&self) -> Value {
        let periods: Vec<&str> = Period::ALL.iter().map(Period::as_str).collect();
        let mut schema = SchemaBuilder::object_schema(vec![
            SchemaProperty::required("symbol", "string", "Ticker symbol, e.g. AAPL"),
            SchemaProperty::optional("period", "string", "Chart range", json!(DEFAULT_PERIOD)),
        ]);
        schema["properties"]["period"] = SchemaBuilder::string_enum(&periods, "Chart range");
        schema["properties"]["period"]["default"] = json!(DEFAULT_PERIOD);
        schema
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let params: FinanceParams = serde_json::from_value(input)
            .map_err(|e| Error::ToolExecution(format!("Invalid input parameters: {}", e)))?;

        Ok(ToolResult::success(self.quote(&params.symbol, &params.period).await))
    }
}
