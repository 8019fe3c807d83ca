//! Terminate tool: the agent's way of declaring the task finished.

use async_trait::async_trait;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};

pub const TERMINATE: &str = "terminate";

pub struct TerminateTool;

#[async_trait]
impl Tool for TerminateTool {
    fn name(&self) -> &str {
        TERMINATE
    }

    fn description(&self) -> &str {
        "Finish the current task when you are done"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Brief reason for finishing"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let reason = arguments["reason"].as_str().unwrap_or("Task finished");
        Ok(ToolResult::text(format!("Terminated: {reason}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reason_is_reported() {
        let result = TerminateTool
            .execute(serde_json::json!({"reason": "all done"}))
            .await
            .unwrap();
        assert_eq!(result.to_string(), "Terminated: all done");
    }

    #[tokio::test]
    async fn default_reason() {
        let result = TerminateTool.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(result.to_string(), "Terminated: Task finished");
    }
}
