//! Bash tool: execute shell commands in the workspace.
//!
//! Commands run through `sh -c` with the workspace root as working
//! directory and a per-call timeout.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

pub struct BashTool {
    workspace_root: PathBuf,
    default_timeout_secs: u64,
}

impl BashTool {
    pub fn new(workspace_root: impl Into<PathBuf>, default_timeout_secs: u64) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            default_timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a bash command in the workspace and return its stdout/stderr"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds",
                    "default": self.default_timeout_secs
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;
        if command.trim().is_empty() {
            return Ok(ToolResult::failure("Empty command"));
        }
        let timeout_secs = arguments["timeout"]
            .as_u64()
            .unwrap_or(self.default_timeout_secs);

        if let Err(e) = tokio::fs::create_dir_all(&self.workspace_root).await {
            return Err(ToolError::ExecutionFailed {
                tool_name: "bash".into(),
                reason: format!("cannot prepare workspace: {e}"),
            });
        }

        debug!(command = %command, timeout_secs, "Executing bash command");

        let child = Command::new("sh")
            .args(["-c", command])
            .current_dir(&self.workspace_root)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: "bash".into(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(command = %command, timeout_secs, "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: "bash".into(),
                    timeout_secs,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %command, exit_code = code, "Command failed");
            let message = if stderr.trim().is_empty() {
                format!("Command exited with code {code}")
            } else {
                stderr.trim().to_string()
            };
            return Ok(ToolResult::failure(message));
        }

        let parts: Vec<&str> = [&*stdout, &*stderr]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        let joined = parts.join("\n");
        let joined = joined.trim();

        Ok(ToolResult::text(if joined.is_empty() {
            "(no output)"
        } else {
            joined
        }))
    }
}
