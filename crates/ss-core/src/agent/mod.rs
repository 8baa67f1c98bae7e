//! Conversational agent
//!
//! The interactive client only talks to the [`Agent`] trait. [`ChatAgent`]
//! is the tool-calling implementation backed by an LLM.

mod chat;

pub use chat::ChatAgent;

use async_trait::async_trait;

use crate::Result;

/// A conversational agent that turns a user task into a text reply
#[async_trait]
pub trait Agent: Send {
    /// Run one user turn and return the final reply
    async fn run(&mut self, task: &str) -> Result<String>;

    /// Forget everything said so far
    fn clear_conversation_history(&mut self);
}
