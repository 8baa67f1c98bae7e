//! LLM API client and types
//!
//! Supports both the Claude API and OpenAI-compatible APIs (Groq, etc.)

mod client;
mod types;

pub use client::LlmClient;
pub use types::*;
