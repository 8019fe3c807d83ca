//! String-replace editor: edit a text file in place.

use async_trait::async_trait;
use std::path::PathBuf;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::files::resolve_path;

pub struct StrReplaceEditorTool {
    root: PathBuf,
}

impl StrReplaceEditorTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for StrReplaceEditorTool {
    fn name(&self) -> &str {
        "str_replace_editor"
    }

    fn description(&self) -> &str {
        "Replace the first occurrence of a string in a text file in the workspace"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "File to edit" },
                "old_string": { "type": "string", "description": "Exact text to replace" },
                "new_string": { "type": "string", "description": "Replacement text" }
            },
            "required": ["file_path", "old_string", "new_string"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let file_path = arguments["file_path"].as_str().unwrap_or("");
        let old_string = arguments["old_string"].as_str().unwrap_or("");
        let new_string = arguments["new_string"].as_str().unwrap_or("");
        if file_path.is_empty() || old_string.is_empty() {
            return Ok(ToolResult::failure("file_path and old_string required"));
        }

        let target = resolve_path(&self.root, file_path);
        let content = match tokio::fs::read_to_string(&target).await {
            Ok(c) => c,
            Err(e) => return Ok(ToolResult::failure(format!("Cannot read {file_path}: {e}"))),
        };

        if !content.contains(old_string) {
            return Ok(ToolResult::failure(format!(
                "old_string not found in {file_path}"
            )));
        }

        debug!(file = %target.display(), "Replacing text");
        let updated = content.replacen(old_string, new_string, 1);
        match tokio::fs::write(&target, updated).await {
            Ok(()) => Ok(ToolResult::text(format!("Updated {file_path}"))),
            Err(e) => Ok(ToolResult::failure(format!("Cannot write {file_path}: {e}"))),
        }
    }
}
