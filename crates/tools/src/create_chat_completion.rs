//! Chat-completion tool: a nested plain completion through the LLM gateway.

use async_trait::async_trait;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use taskpilot_core::{Llm, Message};

pub struct CreateChatCompletionTool {
    llm: Llm,
}

impl CreateChatCompletionTool {
    pub fn new(llm: Llm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Tool for CreateChatCompletionTool {
    fn name(&self) -> &str {
        "create_chat_completion"
    }

    fn description(&self) -> &str {
        "Create a chat completion using the configured LLM"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "Prompt to complete" }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let Some(prompt) = arguments["prompt"].as_str().filter(|p| !p.is_empty()) else {
            return Ok(ToolResult::failure("prompt required"));
        };

        let content = self
            .llm
            .ask(&[Message::user(prompt)], &[])
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "create_chat_completion".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::text(content))
    }
}
