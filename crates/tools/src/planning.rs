//! Planning tool: create and manage step-structured plans.
//!
//! All commands operate on a [`PlanStore`] shared with the planning flow, so
//! a plan created by the model through this tool is the same plan the flow
//! sequences.

use async_trait::async_trait;
use std::sync::Arc;
use taskpilot_core::error::{PlanError, ToolError};
use taskpilot_core::plan::{PlanStore, StepStatus};
use taskpilot_core::tool::{Tool, ToolResult};
use tokio::sync::RwLock;
use tracing::debug;

pub const PLANNING: &str = "planning";

pub struct PlanningTool {
    plans: Arc<RwLock<PlanStore>>,
}

impl PlanningTool {
    pub fn new(plans: Arc<RwLock<PlanStore>>) -> Self {
        Self { plans }
    }

    /// The store this tool mutates.
    pub fn store(&self) -> Arc<RwLock<PlanStore>> {
        Arc::clone(&self.plans)
    }

    async fn run(&self, args: &serde_json::Value) -> Result<String, String> {
        let command = str_arg(args, "command")?;

        if command == "list" {
            let store = self.plans.read().await;
            let lines: Vec<String> = store
                .list()
                .map(|(id, plan)| {
                    format!(
                        "{id}: {} ({}/{} steps completed)",
                        plan.title,
                        plan.completed_count(),
                        plan.len()
                    )
                })
                .collect();
            return Ok(if lines.is_empty() {
                "No plans available".to_string()
            } else {
                lines.join("\n")
            });
        }

        let plan_id = str_arg(args, "plan_id")?;
        debug!(command, plan_id, "Planning command");

        match command {
            "create" => {
                let title = args["title"]
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| format!("Plan {plan_id}"));
                let steps = steps_arg(args).unwrap_or_default();
                let count = steps.len();
                self.plans.write().await.create(plan_id, title.as_str(), steps);
                Ok(format!("Plan '{title}' created with {count} steps"))
            }
            "get" => self.plans.read().await.render(plan_id).map_err(|e| e.to_string()),
            "mark_step" => {
                let index = index_arg(args)?;
                let status = match args["step_status"].as_str() {
                    Some(s) => Some(s.parse::<StepStatus>()?),
                    None => None,
                };
                let notes = args["step_notes"].as_str().map(String::from);
                let status = self
                    .plans
                    .write()
                    .await
                    .mark_step(plan_id, index, status, notes)
                    .map_err(|e| e.to_string())?;
                Ok(format!("Step {index} -> {}", status.as_str()))
            }
            "update" => {
                let title = args["title"].as_str().map(String::from);
                let steps = steps_arg(args);
                let mut store = self.plans.write().await;
                store
                    .update(plan_id, title, steps)
                    .map_err(|e| e.to_string())?;
                store.render(plan_id).map_err(|e| e.to_string())
            }
            "delete" => {
                self.plans
                    .write()
                    .await
                    .delete(plan_id)
                    .map_err(|e| e.to_string())?;
                Ok(format!("Plan {plan_id} deleted"))
            }
            other => Err(PlanError::UnknownCommand(other.to_string()).to_string()),
        }
    }
}

fn str_arg<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, String> {
    args[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PlanError::MissingArgument(key.to_string()).to_string())
}

fn steps_arg(args: &serde_json::Value) -> Option<Vec<String>> {
    args["steps"].as_array().map(|items| {
        items
            .iter()
            .filter_map(|s| s.as_str().map(String::from))
            .collect()
    })
}

fn index_arg(args: &serde_json::Value) -> Result<usize, String> {
    let value = &args["step_index"];
    if let Some(n) = value.as_u64() {
        return Ok(n as usize);
    }
    if let Some(s) = value.as_str()
        && let Ok(n) = s.trim().parse::<usize>()
    {
        return Ok(n);
    }
    Err(PlanError::MissingArgument("step_index".into()).to_string())
}

#[async_trait]
impl Tool for PlanningTool {
    fn name(&self) -> &str {
        PLANNING
    }

    fn description(&self) -> &str {
        "Create and manage a plan with ordered steps and per-step statuses. \
         Commands: create, get, list, mark_step, update, delete."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": ["create", "get", "list", "mark_step", "update", "delete"],
                    "description": "The planning command to run"
                },
                "plan_id": {
                    "type": "string",
                    "description": "Unique plan identifier (required except for list)"
                },
                "title": { "type": "string", "description": "Plan title" },
                "steps": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ordered step descriptions"
                },
                "step_index": { "type": "integer", "description": "Zero-based step index" },
                "step_status": {
                    "type": "string",
                    "enum": ["not_started", "in_progress", "completed", "blocked"]
                },
                "step_notes": { "type": "string", "description": "Notes for the step" }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(match self.run(&arguments).await {
            Ok(output) => ToolResult::text(output),
            Err(error) => ToolResult::failure(error),
        })
    }
}
