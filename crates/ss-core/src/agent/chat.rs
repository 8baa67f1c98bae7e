//! Tool-calling chat agent

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::llm::{LlmClient, Message, MessageContent, MessagesRequest};
use crate::tool::{ToolManager, ToolResult};
use crate::{Error, Result};

use super::Agent;

const MAX_TOKENS: u64 = 4096;

/// Agent that loops LLM → tools → LLM until the model produces a final answer
pub struct ChatAgent {
    client: LlmClient,
    tools: ToolManager,
    config: AgentConfig,
    history: Vec<Message>,
}

impl ChatAgent {
    pub fn new(client: LlmClient, tools: ToolManager, config: AgentConfig) -> Self {
        Self {
            client,
            tools,
            config,
            history: Vec::new(),
        }
    }

    /// Conversation remembered between turns
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Tools the agent can call
    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    async fn execute_tool(&self, name: &str, input: JsonValue) -> ToolResult {
        match self.tools.execute(name, input).await {
            Ok(result) => result,
            Err(e) => ToolResult::error(format!("Tool execution error: {}", e)),
        }
    }

    fn remember(&mut self, task: &str, reply: &str) {
        if self.config.memory_enabled {
            self.history.push(Message::user(task));
            self.history.push(Message::assistant(reply));
        }
    }
}

#[async_trait]
impl Agent for ChatAgent {
    async fn run(&mut self, task: &str) -> Result<String> {
        let mut messages = if self.config.memory_enabled {
            self.history.clone()
        } else {
            Vec::new()
        };
        messages.push(Message::user(task));

        let definitions = self.tools.definitions();
        let tools = (!definitions.is_empty()).then_some(definitions);

        for step in 1..=self.config.max_steps {
            let request = MessagesRequest {
                model: self.client.model().to_string(),
                max_tokens: MAX_TOKENS,
                system: Some(self.config.system_prompt.clone()),
                messages: messages.clone(),
                tools: tools.clone(),
            };

            let response = self.client.messages(request).await?;
            debug!(step, stop_reason = %response.stop_reason, "Agent step");

            match response.stop_reason.as_str() {
                "end_turn" | "stop_sequence" | "stop" | "max_tokens" => {
                    let reply = response.text();
                    self.remember(task, &reply);
                    return Ok(reply);
                }
                "tool_use" | "tool_calls" => {
                    let tool_uses = response.tool_uses();
                    if tool_uses.is_empty() {
                        warn!("tool_use stop_reason but no tool uses found");
                        let reply = response.text();
                        self.remember(task, &reply);
                        return Ok(reply);
                    }

                    messages.push(Message {
                        role: "assistant".to_string(),
                        content: response.content.clone(),
                    });

                    let mut tool_results = Vec::with_capacity(tool_uses.len());
                    for (id, name, input) in tool_uses {
                        info!(tool = %name, "Executing tool");
                        let result = self.execute_tool(&name, input).await;
                        if result.is_error {
                            warn!(tool = %name, output = %result.output, "Tool returned an error");
                        }
                        tool_results.push(MessageContent::ToolResult {
                            tool_use_id: id,
                            content: result.output,
                            is_error: result.is_error,
                        });
                    }

                    messages.push(Message {
                        role: "user".to_string(),
                        content: tool_results,
                    });
                }
                other => {
                    return Err(Error::Llm(format!("Unknown stop_reason: {}", other)));
                }
            }
        }

        warn!(max_steps = self.config.max_steps, "Agent reached the step limit");
        Ok(format!(
            "Agent stopped after reaching the maximum number of steps ({}).",
            self.config.max_steps
        ))
    }

    fn clear_conversation_history(&mut self) {
        self.history.clear();
    }
}
