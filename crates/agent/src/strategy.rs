//! Step strategies: how one agent step thinks and acts.
//!
//! The set is closed. `ToolCall` asks the model for tool selections and
//! dispatches them in order; `Chat` reasons only and finishes after a
//! single reply.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use taskpilot_core::{
    AgentError, AgentState, DomainEvent, Message, MessageToolCall, Result, ToolChoice,
    ToolRegistry,
};
use tracing::{debug, info, warn};

use crate::context::AgentContext;

/// Step result when thinking decided there is nothing to act on.
pub const THINK_ONLY: &str = "Thinking complete - no action needed";

/// Act result when there were no calls and no content.
pub const NOTHING_TO_EXECUTE: &str = "No content or commands to execute";

pub enum Strategy {
    ToolCall(ToolCallStrategy),
    Chat,
}

impl Strategy {
    pub fn tool_call(tools: Arc<ToolRegistry>) -> Self {
        Strategy::ToolCall(ToolCallStrategy::new(tools))
    }

    pub fn tools(&self) -> Option<&ToolRegistry> {
        match self {
            Strategy::ToolCall(s) => Some(&s.tools),
            Strategy::Chat => None,
        }
    }

    /// One think/act round.
    pub(crate) async fn step(&mut self, ctx: &mut AgentContext) -> Result<String> {
        let should_act = match self {
            Strategy::ToolCall(s) => s.think(ctx).await?,
            Strategy::Chat => chat_think(ctx).await?,
        };
        if !should_act {
            return Ok(THINK_ONLY.to_string());
        }
        match self {
            Strategy::ToolCall(s) => s.act(ctx).await,
            Strategy::Chat => Ok(last_content(ctx)),
        }
    }

    pub(crate) fn clear_pending(&mut self) {
        if let Strategy::ToolCall(s) = self {
            s.pending.clear();
        }
    }
}

/// Tool-selecting strategy with an ordered dispatcher.
pub struct ToolCallStrategy {
    tools: Arc<ToolRegistry>,
    pending: Vec<MessageToolCall>,
}

impl ToolCallStrategy {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            pending: Vec::new(),
        }
    }

    async fn think(&mut self, ctx: &mut AgentContext) -> Result<bool> {
        if let Some(prompt) = ctx.next_step_prompt.clone() {
            ctx.memory.push(Message::user(prompt));
        }

        let choice = ctx.settings.tool_choice;
        let response = ctx
            .llm
            .ask_tool(
                ctx.memory.messages(),
                &ctx.system_messages(),
                self.tools.definitions(),
                choice,
            )
            .await?;

        let content = response.content.unwrap_or_default();
        self.pending = response.tool_calls;

        info!(agent = %ctx.name, "{}'s thoughts: {}", ctx.name, content);
        info!(
            agent = %ctx.name,
            tools = ?self.pending.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "{} selected {} tool(s)",
            ctx.name,
            self.pending.len()
        );

        if self.pending.is_empty() {
            ctx.memory.push(Message::assistant(content.clone()));
        } else {
            ctx.memory
                .push(Message::from_tool_calls(self.pending.clone(), content.clone()));
        }

        let has_calls = !self.pending.is_empty();
        Ok(match choice {
            ToolChoice::None => !content.is_empty(),
            ToolChoice::Required if !has_calls => true,
            ToolChoice::Auto if !has_calls => !content.is_empty(),
            _ => has_calls,
        })
    }

    async fn act(&mut self, ctx: &mut AgentContext) -> Result<String> {
        if self.pending.is_empty() {
            if ctx.settings.tool_choice == ToolChoice::Required {
                return Err(AgentError::ToolCallsRequired.into());
            }
            return Ok(last_content(ctx));
        }

        let calls = std::mem::take(&mut self.pending);
        let mut observations = Vec::with_capacity(calls.len());
        for call in &calls {
            let (observation, image) = self.dispatch(ctx, call).await;
            let observation = truncate_chars(observation, ctx.settings.max_observe);
            debug!(tool = %call.name, "Tool completed");
            ctx.memory.push(Message::tool_result(
                observation.clone(),
                call.name.as_str(),
                call.id.as_str(),
                image,
            ));
            observations.push(observation);
        }
        Ok(observations.join("\n\n"))
    }

    /// Execute one call, turning every failure into an observation string.
    ///
    /// Returns the observation and any image the tool attached.
    async fn dispatch(
        &self,
        ctx: &mut AgentContext,
        call: &MessageToolCall,
    ) -> (String, Option<String>) {
        let name = call.name.as_str();
        if name.is_empty() {
            return ("Error: Invalid command format".to_string(), None);
        }
        if !self.tools.contains(name) {
            return (format!("Error: Unknown tool '{name}'"), None);
        }

        let raw = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };
        let arguments: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool arguments are not valid JSON");
                return (
                    format!("Error parsing arguments for {name}: Invalid JSON format"),
                    None,
                );
            }
        };

        info!(tool = %name, "Activating tool");
        let started = Instant::now();
        let outcome = self.tools.execute(name, arguments).await;
        ctx.emit(DomainEvent::ToolExecuted {
            tool_name: name.to_string(),
            success: matches!(&outcome, Ok(r) if !r.is_error()),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        if ctx.is_special_tool(name) {
            info!(tool = %name, "Special tool has completed the task");
            ctx.set_state(AgentState::Finished);
        }

        match outcome {
            Ok(result) if result.is_empty() => (
                format!("Cmd `{name}` completed with no output"),
                result.image,
            ),
            Ok(result) => {
                let image = result.image.clone();
                (
                    format!("Observed output of cmd `{name}` executed:\n{result}"),
                    image,
                )
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool failed");
                (
                    format!("Error: Tool '{name}' encountered a problem: {e}"),
                    None,
                )
            }
        }
    }
}

/// Reason-only think: one plain completion, then finish.
async fn chat_think(ctx: &mut AgentContext) -> Result<bool> {
    if let Some(prompt) = ctx.next_step_prompt.clone() {
        ctx.memory.push(Message::user(prompt));
    }
    let reply = ctx
        .llm
        .ask(ctx.memory.messages(), &ctx.system_messages())
        .await?;
    info!(agent = %ctx.name, "{}'s reply: {}", ctx.name, reply);
    ctx.memory.push(Message::assistant(reply));
    ctx.set_state(AgentState::Finished);
    Ok(false)
}

fn last_content(ctx: &AgentContext) -> String {
    ctx.memory
        .last()
        .map(|m| m.text())
        .filter(|t| !t.is_empty())
        .unwrap_or(NOTHING_TO_EXECUTE)
        .to_string()
}

fn truncate_chars(text: String, limit: Option<usize>) -> String {
    match limit.and_then(|n| text.char_indices().nth(n)) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}
