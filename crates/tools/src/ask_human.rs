//! Ask-human tool: surface a question for the operator.

use async_trait::async_trait;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};

pub struct AskHumanTool;

#[async_trait]
impl Tool for AskHumanTool {
    fn name(&self) -> &str {
        "ask_human"
    }

    fn description(&self) -> &str {
        "Ask the human operator for information or a decision"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "The question to ask" }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        match arguments["question"].as_str().filter(|q| !q.is_empty()) {
            Some(question) => Ok(ToolResult::text(format!("Question for human: {question}"))),
            None => Ok(ToolResult::failure("question required")),
        }
    }
}
