//! Tool system
//!
//! Tools are what the agent calls when the model asks for a lookup.

pub mod definition;
pub mod manager;
pub mod traits;

pub use definition::{SchemaBuilder, SchemaProperty, ToolDefinition};
pub use manager::ToolManager;
pub use traits::{Tool, ToolResult};
