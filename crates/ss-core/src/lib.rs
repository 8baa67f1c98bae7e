//! ss-core: core library for search-services
//!
//! Configuration, the error type, the tool system, the LLM client and the
//! conversational agent shared by the tool server and the interactive client.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod tool;

pub use agent::{Agent, ChatAgent};
pub use config::{AgentConfig, Config, Keys, LlmConfig, LlmProvider, McpConfig, SearchConfig};
pub use error::{Error, Result};
pub use llm::{LlmClient, Message, MessageContent, ToolDefinition};
pub use tool::{SchemaBuilder, SchemaProperty, Tool, ToolManager, ToolResult};
