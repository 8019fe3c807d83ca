//! The agent state machine.
//!
//! ```text
//! Idle ──run──▶ Running ──step*──▶ Finished   (a special tool, or a chat reply)
//!                  │                Idle       (step budget exhausted)
//!                  └──step error──▶ Error
//! ```
//!
//! `run` is only accepted from `Idle`. `Finished` and `Error` persist until
//! [`Agent::reset`].

use chrono::Utc;
use std::sync::Arc;
use taskpilot_core::{
    AgentError, AgentSettings, AgentState, DomainEvent, EventBus, Llm, Memory, Message,
    Result, Role, ToolRegistry,
};
use tracing::{info, warn};

use crate::context::AgentContext;
use crate::prompt::STUCK_PROMPT;
use crate::strategy::Strategy;

/// Returned by `run` when the loop executed no step.
pub const NO_STEPS: &str = "No steps executed";

pub struct Agent {
    description: Option<String>,
    ctx: AgentContext,
    strategy: Strategy,
}

impl Agent {
    pub fn new(name: impl Into<String>, llm: Llm, strategy: Strategy) -> Self {
        Self {
            description: None,
            ctx: AgentContext::new(name.into(), llm, AgentSettings::default()),
            strategy,
        }
    }

    /// An agent that selects and dispatches tools from `tools`.
    pub fn tool_call(name: impl Into<String>, llm: Llm, tools: Arc<ToolRegistry>) -> Self {
        Self::new(name, llm, Strategy::tool_call(tools))
    }

    /// A reason-only agent that finishes after one reply.
    pub fn chat(name: impl Into<String>, llm: Llm) -> Self {
        Self::new(name, llm, Strategy::Chat)
    }

    /// Replace the settings. Memory is rebuilt with the new capacity,
    /// keeping the most recent messages.
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        let mut memory = Memory::new(settings.memory_capacity);
        memory.extend(self.ctx.memory.messages().iter().cloned());
        self.ctx.memory = memory;
        self.ctx.settings = settings;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.ctx.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_next_step_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.ctx.next_step_prompt = Some(prompt.into());
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.ctx.events = Some(bus);
        self
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn state(&self) -> AgentState {
        self.ctx.state
    }

    pub fn current_step(&self) -> u32 {
        self.ctx.current_step
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.ctx.settings
    }

    pub fn memory(&self) -> &Memory {
        &self.ctx.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.ctx.memory
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.ctx.system_prompt.as_deref()
    }

    pub fn next_step_prompt(&self) -> Option<&str> {
        self.ctx.next_step_prompt.as_deref()
    }

    /// The tools this agent may call; `None` for a chat agent.
    pub fn tools(&self) -> Option<&ToolRegistry> {
        self.strategy.tools()
    }

    /// Run the loop on an optional request and return the step log.
    ///
    /// The request, when non-empty, is appended to memory as a user message.
    /// Each step contributes a `Step N: ...` line. Running out of steps
    /// returns the agent to `Idle` and appends a termination line; a step
    /// error leaves it in `Error` and is returned.
    pub async fn run(&mut self, request: Option<&str>) -> Result<String> {
        if self.ctx.state != AgentState::Idle {
            return Err(AgentError::InvalidState {
                state: self.ctx.state.to_string(),
            }
            .into());
        }

        if let Some(request) = request.filter(|r| !r.is_empty()) {
            self.ctx.memory.push(Message::user(request));
        }

        let max_steps = self.ctx.settings.max_steps;
        let mut results = Vec::new();
        self.ctx.set_state(AgentState::Running);

        while self.ctx.current_step < max_steps && self.ctx.state != AgentState::Finished {
            self.ctx.current_step += 1;
            let step = self.ctx.current_step;
            info!(agent = %self.ctx.name, "Executing step {step}/{max_steps}");

            let output = match self.strategy.step(&mut self.ctx).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(agent = %self.ctx.name, step, error = %e, "Step failed");
                    self.ctx.set_state(AgentState::Error);
                    self.ctx.emit(DomainEvent::ErrorOccurred {
                        context: format!("{} step {step}", self.ctx.name),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(e);
                }
            };

            if self.is_stuck() {
                self.handle_stuck_state();
            }

            results.push(format!("Step {step}: {output}"));
            self.ctx.emit(DomainEvent::StepCompleted {
                agent: self.ctx.name.clone(),
                step,
                timestamp: Utc::now(),
            });
        }

        if self.ctx.state != AgentState::Finished {
            self.ctx.current_step = 0;
            self.ctx.set_state(AgentState::Idle);
            results.push(format!("Terminated: Reached max steps ({max_steps})"));
        }

        if results.is_empty() {
            return Ok(NO_STEPS.to_string());
        }
        Ok(results.join("\n"))
    }

    /// Return to `Idle` with a fresh step counter. Memory is kept.
    pub fn reset(&mut self) {
        self.ctx.current_step = 0;
        self.strategy.clear_pending();
        self.ctx.set_state(AgentState::Idle);
    }

    /// Whether the latest message repeats earlier assistant output at least
    /// `duplicate_threshold` times.
    pub fn is_stuck(&self) -> bool {
        let messages = self.ctx.memory.messages();
        let Some((last, earlier)) = messages.split_last() else {
            return false;
        };
        if earlier.is_empty() || last.text().is_empty() {
            return false;
        }
        let duplicates = earlier
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant && m.text() == last.text())
            .count();
        duplicates >= self.ctx.settings.duplicate_threshold
    }

    fn handle_stuck_state(&mut self) {
        let previous = self.ctx.next_step_prompt.take().unwrap_or_default();
        self.ctx.next_step_prompt = if previous.starts_with(STUCK_PROMPT) {
            Some(previous)
        } else {
            Some(format!("{STUCK_PROMPT}\n{previous}"))
        };
        warn!(agent = %self.ctx.name, "Agent detected stuck state. Added prompt: {STUCK_PROMPT}");
        self.ctx.emit(DomainEvent::StuckDetected {
            agent: self.ctx.name.clone(),
            timestamp: Utc::now(),
        });
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.ctx.name)
            .field("state", &self.ctx.state)
            .field("current_step", &self.ctx.current_step)
            .field("memory_len", &self.ctx.memory.len())
            .finish()
    }
}
