//! Plan orchestrator: decompose a request into a plan, then drive the plan
//! step by step through executor agents.
//!
//! Step status changes go through the planning tool so the model-visible
//! tool and the orchestrator share one notion of plan state. When the tool
//! fails to record a completion or a block, the orchestrator writes the
//! status into the store directly so the loop always advances.

use chrono::Utc;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::{Arc, LazyLock};
use taskpilot_core::{
    AgentError, DomainEvent, EventBus, Llm, Message, PlanStore, Result, StepStatus, Tool,
    ToolChoice,
};
use taskpilot_tools::{PLANNING, PlanningTool};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::agent::Agent;
use crate::prompt;

const DEFAULT_STEPS: [&str; 3] = ["Analyze request", "Execute task", "Verify results"];

static STEP_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Z_]+)\]").expect("step type pattern is valid"));

/// Sequences a plan's steps across registered executor agents.
pub struct PlanningFlow {
    llm: Llm,
    agents: Vec<(String, Agent)>,
    primary_key: Option<String>,
    executor_keys: Vec<String>,
    plans: Arc<RwLock<PlanStore>>,
    planning_tool: Arc<dyn Tool>,
    plan_id: String,
    current_step_index: Option<usize>,
    events: Option<Arc<EventBus>>,
}

impl PlanningFlow {
    /// A flow with its own plan store and a fresh `plan_{millis}` id.
    pub fn new(llm: Llm) -> Self {
        let plans = Arc::new(RwLock::new(PlanStore::new()));
        Self {
            llm,
            agents: Vec::new(),
            primary_key: None,
            executor_keys: Vec::new(),
            planning_tool: Arc::new(PlanningTool::new(plans.clone())),
            plans,
            plan_id: format!("plan_{}", Utc::now().timestamp_millis()),
            current_step_index: None,
            events: None,
        }
    }

    /// Share `plans` with other holders, such as an agent's planning tool.
    pub fn with_plan_store(mut self, plans: Arc<RwLock<PlanStore>>) -> Self {
        self.planning_tool = Arc::new(PlanningTool::new(plans.clone()));
        self.plans = plans;
        self
    }

    /// Route step tracking through `tool`, which must operate on this
    /// flow's plan store.
    pub fn with_planning_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.planning_tool = tool;
        self
    }

    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = plan_id.into();
        self
    }

    /// Register an executor under `key`. A later registration under the
    /// same key replaces the agent in place.
    pub fn with_agent(mut self, key: impl Into<String>, agent: Agent) -> Self {
        let key = key.into();
        match self.agents.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = agent,
            None => self.agents.push((key, agent)),
        }
        self
    }

    pub fn with_primary(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    /// Restrict and order the agents used for untagged steps.
    pub fn with_executors(mut self, keys: Vec<String>) -> Self {
        self.executor_keys = keys;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn plans(&self) -> Arc<RwLock<PlanStore>> {
        self.plans.clone()
    }

    pub fn current_step_index(&self) -> Option<usize> {
        self.current_step_index
    }

    pub fn agent(&self, key: &str) -> Option<&Agent> {
        self.agents.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    fn agent_mut(&mut self, key: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    /// The primary key, or the first registered key.
    fn primary(&self) -> Option<String> {
        self.primary_key
            .as_ref()
            .filter(|k| self.agent(k).is_some())
            .or_else(|| self.agents.first().map(|(k, _)| k))
            .cloned()
    }

    pub fn primary_agent(&self) -> Option<&Agent> {
        self.primary().and_then(|k| self.agent(&k))
    }

    /// Create a plan for `input` (unless empty) and run every open step.
    ///
    /// Returns one line per step result followed by the closing summary.
    pub async fn execute(&mut self, input: &str) -> Result<String> {
        if self.primary().is_none() {
            return Err(AgentError::NoPrimaryAgent.into());
        }

        if !input.is_empty() {
            self.create_initial_plan(input).await?;
        }

        let mut result = String::new();
        loop {
            let Some((index, text, step_type)) = self.next_step().await else {
                result.push_str(&self.finalize_plan().await?);
                break;
            };
            self.current_step_index = Some(index);

            let Some(key) = self.executor_key(step_type.as_deref()) else {
                return Err(AgentError::NoPrimaryAgent.into());
            };
            let step_result = self.execute_step(&key, index, &text).await;
            result.push_str(&step_result);
            result.push('\n');
        }
        Ok(result)
    }

    async fn create_initial_plan(&mut self, request: &str) -> Result<()> {
        info!(plan_id = %self.plan_id, "Creating initial plan");
        let response = self
            .llm
            .ask_tool(
                &[Message::user(prompt::planning_request(request))],
                &[Message::system(prompt::PLANNING_SYSTEM_PROMPT)],
                vec![self.planning_tool.to_definition()],
                ToolChoice::Auto,
            )
            .await?;

        if let Some(call) = response.tool_calls.iter().find(|c| c.name == PLANNING) {
            let mut args = match serde_json::from_str::<Value>(&call.arguments) {
                Ok(Value::Object(map)) => Value::Object(map),
                _ => {
                    warn!("Failed to parse planning arguments, using an empty object");
                    json!({})
                }
            };
            args["plan_id"] = json!(self.plan_id);
            match self.planning_tool.execute(args).await {
                Ok(result) => info!("Plan creation result: {result}"),
                Err(e) => warn!(error = %e, "Planning tool rejected the proposed plan"),
            }
        }

        if !self.plans.read().await.contains(&self.plan_id) {
            warn!("No plan from the model, creating the default plan");
            let title = default_title(request);
            let steps: Vec<String> = DEFAULT_STEPS.iter().map(|s| s.to_string()).collect();
            let created = self
                .planning_tool
                .execute(json!({
                    "command": "create",
                    "plan_id": self.plan_id,
                    "title": title,
                    "steps": steps,
                }))
                .await;
            if !matches!(&created, Ok(r) if !r.is_error()) {
                self.plans.write().await.create(&self.plan_id, title, steps);
            }
        }
        Ok(())
    }

    /// The first open step, marked in progress (best-effort).
    async fn next_step(&mut self) -> Option<(usize, String, Option<String>)> {
        let (index, text) = {
            let store = self.plans.read().await;
            let plan = store.get(&self.plan_id)?;
            let index = plan.next_open_step()?;
            (index, plan.steps()[index].clone())
        };
        let step_type = step_type(&text);

        if self
            .track(index, StepStatus::InProgress, None)
            .await
            .is_err()
        {
            warn!(step = index, "Could not mark step in progress");
        }
        Some((index, text, step_type))
    }

    /// Tagged executor if registered, else the first registered executor,
    /// else the primary agent.
    fn executor_key(&self, step_type: Option<&str>) -> Option<String> {
        if let Some(t) = step_type
            && self.agent(t).is_some()
        {
            return Some(t.to_string());
        }
        let first_executor = if self.executor_keys.is_empty() {
            self.agents.first().map(|(k, _)| k.clone())
        } else {
            self.executor_keys
                .iter()
                .find(|k| self.agent(k).is_some())
                .cloned()
        };
        first_executor.or_else(|| self.primary())
    }

    async fn execute_step(&mut self, key: &str, index: usize, text: &str) -> String {
        let plan_text = self.plan_text().await;
        let request = prompt::step_request(&plan_text, index, text);

        let Some(agent) = self.agent_mut(key) else {
            return format!("Error executing step {index}: no agent registered as {key}");
        };
        if agent.state().is_terminal() {
            agent.reset();
        }
        info!(executor = %key, step = index, "Executing plan step");

        match agent.run(Some(&request)).await {
            Ok(step_result) => {
                self.settle(index, StepStatus::Completed, None).await;
                step_result
            }
            Err(e) => {
                error!(executor = %key, step = index, error = %e, "Step execution failed");
                self.settle(index, StepStatus::Blocked, Some(e.to_string()))
                    .await;
                format!("Error executing step {index}: {e}")
            }
        }
    }

    /// Record a final step status, writing the store directly when the
    /// tracking tool fails.
    async fn settle(&self, index: usize, status: StepStatus, notes: Option<String>) {
        if let Err(reason) = self.track(index, status, notes).await {
            warn!(step = index, %reason, "Step tracking failed, updating plan directly");
            match self
                .plans
                .write()
                .await
                .force_status(&self.plan_id, index, status)
            {
                Ok(()) => self.announce(index, status),
                Err(e) => warn!(step = index, error = %e, "Could not update plan"),
            }
        }
    }

    /// Mark a step through the planning tool.
    async fn track(
        &self,
        index: usize,
        status: StepStatus,
        notes: Option<String>,
    ) -> std::result::Result<(), String> {
        let mut args = json!({
            "command": "mark_step",
            "plan_id": self.plan_id,
            "step_index": index,
            "step_status": status.as_str(),
        });
        if let Some(notes) = notes {
            args["step_notes"] = json!(notes);
        }
        match self.planning_tool.execute(args).await {
            Ok(result) if result.is_error() => Err(result.to_string()),
            Ok(_) => {
                self.announce(index, status);
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn announce(&self, index: usize, status: StepStatus) {
        if let Some(bus) = &self.events {
            bus.publish(DomainEvent::PlanStepUpdated {
                plan_id: self.plan_id.clone(),
                index,
                status,
                timestamp: Utc::now(),
            });
        }
    }

    async fn plan_text(&self) -> String {
        let rendered = self
            .planning_tool
            .execute(json!({"command": "get", "plan_id": self.plan_id}))
            .await;
        match rendered {
            Ok(result) if !result.is_error() => result.to_string(),
            _ => match self.plans.read().await.render(&self.plan_id) {
                Ok(text) => text,
                Err(e) => format!("Error: Unable to retrieve plan: {e}"),
            },
        }
    }

    async fn finalize_plan(&self) -> Result<String> {
        let plan_text = self.plan_text().await;
        let summary = self
            .llm
            .ask(
                &[Message::user(prompt::summary_request(&plan_text))],
                &[Message::system(prompt::SUMMARY_SYSTEM_PROMPT)],
            )
            .await?;
        Ok(format!("Plan completed:\n\n{summary}"))
    }
}

/// The lowercased `[TAG]` in a step's text, if any.
fn step_type(text: &str) -> Option<String> {
    STEP_TYPE.captures(text).map(|c| c[1].to_lowercase())
}

fn default_title(request: &str) -> String {
    let mut chars = request.chars();
    let head: String = chars.by_ref().take(50).collect();
    if chars.next().is_some() {
        format!("Plan for: {head}...")
    } else {
        format!("Plan for: {head}")
    }
}
