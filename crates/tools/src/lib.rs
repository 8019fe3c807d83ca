//! Built-in tool implementations for taskpilot.
//!
//! Tools give the agent the ability to act in the world:
//! run shell commands and Python, create and edit files, search the web,
//! manage plans, ask the operator, and finish the task.

pub mod ask_human;
pub mod bash;
pub mod create_chat_completion;
pub mod files;
pub mod planning;
pub mod python_execute;
pub mod str_replace_editor;
pub mod terminate;
pub mod web_search;

use std::path::PathBuf;
use std::sync::Arc;
use taskpilot_config::ToolsConfig;
use taskpilot_core::Llm;
use taskpilot_core::plan::PlanStore;
use taskpilot_core::tool::ToolRegistry;
use tokio::sync::RwLock;

pub use ask_human::AskHumanTool;
pub use bash::BashTool;
pub use create_chat_completion::CreateChatCompletionTool;
pub use files::{AppendFileTool, CreateFileTool, DeleteFileTool};
pub use planning::{PLANNING, PlanningTool};
pub use python_execute::PythonExecuteTool;
pub use str_replace_editor::StrReplaceEditorTool;
pub use terminate::{TERMINATE, TerminateTool};
pub use web_search::WebSearchTool;

/// Settings the built-in tools are constructed with.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    pub workspace_root: PathBuf,
    pub bash_timeout_secs: u64,
    pub python_timeout_secs: u64,
}

impl From<&ToolsConfig> for ToolOptions {
    fn from(config: &ToolsConfig) -> Self {
        Self {
            workspace_root: config.workspace_root(),
            bash_timeout_secs: config.bash_timeout_secs,
            python_timeout_secs: config.python_timeout_secs,
        }
    }
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self::from(&ToolsConfig::default())
    }
}

/// Create a registry with every built-in tool.
///
/// `plans` is the store the `planning` tool mutates; pass the same store to
/// a planning flow so both see one set of plans. `create_chat_completion`
/// is only registered when an LLM is supplied. `terminate` is always last.
pub fn default_registry(
    options: &ToolOptions,
    plans: Arc<RwLock<PlanStore>>,
    llm: Option<Llm>,
) -> ToolRegistry {
    let root = &options.workspace_root;
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(BashTool::new(root, options.bash_timeout_secs)));
    registry.register(Box::new(PythonExecuteTool::new(
        root,
        options.python_timeout_secs,
    )));
    registry.register(Box::new(StrReplaceEditorTool::new(root)));
    registry.register(Box::new(CreateFileTool::new(root)));
    registry.register(Box::new(AppendFileTool::new(root)));
    registry.register(Box::new(DeleteFileTool::new(root)));
    registry.register(Box::new(WebSearchTool::new()));
    registry.register(Box::new(PlanningTool::new(plans)));
    registry.register(Box::new(AskHumanTool));
    if let Some(llm) = llm {
        registry.register(Box::new(CreateChatCompletionTool::new(llm)));
    }
    registry.register(Box::new(TerminateTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtins_in_order() {
        let registry = default_registry(
            &ToolOptions::default(),
            Arc::new(RwLock::new(PlanStore::new())),
            None,
        );
        assert_eq!(
            registry.names(),
            vec![
                "bash",
                "python_execute",
                "str_replace_editor",
                "create_file",
                "append_file",
                "delete_file",
                "web_search",
                "planning",
                "ask_human",
                "terminate",
            ]
        );
        for def in registry.definitions() {
            assert_eq!(def.parameters["type"], "object", "{} schema", def.name);
        }
    }

    #[test]
    fn options_follow_config() {
        let config = ToolsConfig {
            bash_timeout_secs: 7,
            python_timeout_secs: 3,
            workspace_root: Some(PathBuf::from("/srv/work")),
        };
        let options = ToolOptions::from(&config);
        assert_eq!(options.workspace_root, PathBuf::from("/srv/work"));
        assert_eq!(options.bash_timeout_secs, 7);
        assert_eq!(options.python_timeout_secs, 3);
    }
}
