//! Python tool: run a code snippet in a separate `python3` process.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::debug;

pub struct PythonExecuteTool {
    workspace_root: PathBuf,
    default_timeout_secs: u64,
}

impl PythonExecuteTool {
    pub fn new(workspace_root: impl Into<PathBuf>, default_timeout_secs: u64) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            default_timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for PythonExecuteTool {
    fn name(&self) -> &str {
        "python_execute"
    }

    fn description(&self) -> &str {
        "Execute Python code in a separate process. Only printed output is returned, so use print() to see results."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python code to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds",
                    "default": self.default_timeout_secs
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let code = arguments["code"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'code' argument".into()))?;
        if code.trim().is_empty() {
            return Ok(ToolResult::failure("code required"));
        }
        let timeout_secs = arguments["timeout"]
            .as_u64()
            .unwrap_or(self.default_timeout_secs);

        let mut command = Command::new("python3");
        command.args(["-c", code]).kill_on_drop(true);
        if self.workspace_root.is_dir() {
            command.current_dir(&self.workspace_root);
        }

        debug!(bytes = code.len(), timeout_secs, "Executing python snippet");

        match tokio::time::timeout(Duration::from_secs(timeout_secs), command.output()).await {
            Err(_) => Ok(ToolResult::failure("Timeout")),
            Ok(Err(e)) => Err(ToolError::ExecutionFailed {
                tool_name: "python_execute".into(),
                reason: e.to_string(),
            }),
            Ok(Ok(output)) if output.status.success() => Ok(ToolResult::text(
                String::from_utf8_lossy(&output.stdout).trim(),
            )),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                Ok(ToolResult::failure(if stderr.is_empty() {
                    format!("Exited with code {}", output.status.code().unwrap_or(-1))
                } else {
                    stderr.to_string()
                }))
            }
        }
    }
}
