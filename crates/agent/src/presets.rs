//! Ready-made agents and flows built from configuration.

use std::sync::Arc;
use taskpilot_config::AppConfig;
use taskpilot_core::{Llm, PlanStore};
use taskpilot_tools::{ToolOptions, default_registry};
use tokio::sync::RwLock;

use crate::agent::Agent;
use crate::flow::PlanningFlow;
use crate::prompt;

/// Key the default agent is registered under in a flow.
pub const PILOT: &str = "pilot";

/// The general-purpose tool-calling agent with every built-in tool.
///
/// `plans` backs the agent's `planning` tool; share it with a flow so the
/// agent and the orchestrator see the same plans.
pub fn pilot_agent(config: &AppConfig, llm: Llm, plans: Arc<RwLock<PlanStore>>) -> Agent {
    let options = ToolOptions::from(&config.tools);
    let tools = default_registry(&options, plans, Some(llm.clone()));
    Agent::tool_call("TaskPilot", llm, Arc::new(tools))
        .with_description("A versatile agent that can solve various tasks using multiple tools")
        .with_settings(config.agent.to_settings())
        .with_system_prompt(prompt::system_prompt(&options.workspace_root))
        .with_next_step_prompt(prompt::NEXT_STEP_PROMPT)
}

/// A planning flow driving a single [`pilot_agent`].
pub fn pilot_flow(config: &AppConfig, llm: Llm) -> PlanningFlow {
    let plans = Arc::new(RwLock::new(PlanStore::new()));
    let agent = pilot_agent(config, llm.clone(), plans.clone());
    let flow = PlanningFlow::new(llm)
        .with_plan_store(plans)
        .with_agent(PILOT, agent);
    if config.flow.executors.is_empty() {
        flow
    } else {
        flow.with_executors(config.flow.executors.clone())
    }
}
