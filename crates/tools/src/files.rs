//! File management tools scoped to the workspace root.
//!
//! Relative paths resolve against the workspace root; absolute paths are
//! used as given.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tokio::io::AsyncWriteExt;

pub(crate) fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

fn required<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

fn path_schema(path_doc: &str, with_content: Option<&str>) -> serde_json::Value {
    let mut schema = serde_json::json!({
        "type": "object",
        "properties": {
            "path": { "type": "string", "description": path_doc }
        },
        "required": ["path"]
    });
    if let Some(content_doc) = with_content {
        schema["properties"]["content"] =
            serde_json::json!({ "type": "string", "description": content_doc });
        schema["required"] = serde_json::json!(["path", "content"]);
    }
    schema
}

/// Create (or overwrite) a file, creating parent directories.
pub struct CreateFileTool {
    root: PathBuf,
}

impl CreateFileTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Create a new file with a given path and content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        path_schema(
            "Path of the new file to create.",
            Some("Content to write into the file."),
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = required(&arguments, "path")?;
        let content = required(&arguments, "content")?;
        let target = resolve_path(&self.root, path);

        if let Some(parent) = target.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::failure(format!("Failed to create file: {e}")));
        }

        match tokio::fs::write(&target, content).await {
            Ok(()) => Ok(ToolResult::text(format!("File created at {path}"))),
            Err(e) => Ok(ToolResult::failure(format!("Failed to create file: {e}"))),
        }
    }
}

/// Append to an existing file.
pub struct AppendFileTool {
    root: PathBuf,
}

impl AppendFileTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for AppendFileTool {
    fn name(&self) -> &str {
        "append_file"
    }

    fn description(&self) -> &str {
        "Append content to an existing file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        path_schema(
            "Path of the file to append to.",
            Some("Content to append to the file."),
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = required(&arguments, "path")?;
        let content = required(&arguments, "content")?;
        let target = resolve_path(&self.root, path);

        if !target.is_file() {
            return Ok(ToolResult::failure(format!("File not found: {path}")));
        }

        let appended = async {
            let mut file = tokio::fs::OpenOptions::new()
                .append(true)
                .open(&target)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await
        }
        .await;

        match appended {
            Ok(()) => Ok(ToolResult::text(format!("Appended content to {path}"))),
            Err(e) => Ok(ToolResult::failure(format!("Failed to append to file: {e}"))),
        }
    }
}

/// Delete a file.
pub struct DeleteFileTool {
    root: PathBuf,
}

impl DeleteFileTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file at the given path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        path_schema("Path of the file to delete.", None)
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = required(&arguments, "path")?;
        let target = resolve_path(&self.root, path);

        if !target.is_file() {
            return Ok(ToolResult::failure(format!("File not found: {path}")));
        }

        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(ToolResult::text(format!("Deleted file at {path}"))),
            Err(e) => Ok(ToolResult::failure(format!("Failed to delete file: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relative_paths_join_root() {
        let root = Path::new("/work");
        assert_eq!(resolve_path(root, "a/b.txt"), PathBuf::from("/work/a/b.txt"));
        assert_eq!(resolve_path(root, "/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn schemas_list_required_fields() {
        let create = CreateFileTool::new("/work").parameters_schema();
        assert_eq!(create["required"], json!(["path", "content"]));
        let delete = DeleteFileTool::new("/work").parameters_schema();
        assert_eq!(delete["required"], json!(["path"]));
    }

    #[tokio::test]
    async fn create_append_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let created = CreateFileTool::new(root)
            .execute(json!({"path": "notes/todo.txt", "content": "one\n"}))
            .await
            .unwrap();
        assert_eq!(created.to_string(), "File created at notes/todo.txt");

        let appended = AppendFileTool::new(root)
            .execute(json!({"path": "notes/todo.txt", "content": "two\n"}))
            .await
            .unwrap();
        assert!(!appended.is_error());
        let text = std::fs::read_to_string(root.join("notes/todo.txt")).unwrap();
        assert_eq!(text, "one\ntwo\n");

        let deleted = DeleteFileTool::new(root)
            .execute(json!({"path": "notes/todo.txt"}))
            .await
            .unwrap();
        assert_eq!(deleted.to_string(), "Deleted file at notes/todo.txt");
        assert!(!root.join("notes/todo.txt").exists());
    }

    #[tokio::test]
    async fn missing_file_is_error_result() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppendFileTool::new(dir.path())
            .execute(json!({"path": "ghost.txt", "content": "boo"}))
            .await
            .unwrap();
        assert_eq!(result.error.as_deref(), Some("File not found: ghost.txt"));

        let result = DeleteFileTool::new(dir.path())
            .execute(json!({"path": "ghost.txt"}))
            .await
            .unwrap();
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn missing_content_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = CreateFileTool::new(dir.path())
            .execute(json!({"path": "x.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
