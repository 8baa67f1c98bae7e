//! ss-mcp: MCP (Model Context Protocol) integration
//!
//! The server side exposes the search tools over stdio. The client side
//! connects to configured MCP servers and adapts their tools to
//! [`ss_core::Tool`].

pub mod adapter;
pub mod client;
pub mod config;
pub mod registry;
pub mod server;

pub use adapter::McpToolAdapter;
pub use client::{McpClient, McpTool};
pub use config::{McpConfig, McpServerConfig};
pub use registry::{McpRegistry, initialize_mcp_tools};
pub use server::{SearchServer, serve_stdio};
