//! Error types for ss-core

use thiserror::Error;

/// Main error type for ss-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ss-core
pub type Result<T> = std::result::Result<T, Error>;
