//! Per-agent mutable state shared between the run loop and its strategy.

use chrono::Utc;
use std::sync::Arc;
use taskpilot_core::{AgentSettings, AgentState, DomainEvent, EventBus, Llm, Memory, Message};
use tracing::debug;

/// Everything a step may read or mutate.
///
/// Memory is the only channel of state carried between steps; the rest is
/// configuration plus the lifecycle state the run loop inspects.
pub struct AgentContext {
    pub(crate) name: String,
    pub(crate) llm: Llm,
    pub(crate) memory: Memory,
    pub(crate) state: AgentState,
    pub(crate) current_step: u32,
    pub(crate) settings: AgentSettings,
    pub(crate) system_prompt: Option<String>,
    pub(crate) next_step_prompt: Option<String>,
    pub(crate) events: Option<Arc<EventBus>>,
}

impl AgentContext {
    pub(crate) fn new(name: String, llm: Llm, settings: AgentSettings) -> Self {
        Self {
            name,
            llm,
            memory: Memory::new(settings.memory_capacity),
            state: AgentState::Idle,
            current_step: 0,
            settings,
            system_prompt: None,
            next_step_prompt: None,
            events: None,
        }
    }

    /// Move to `to`, announcing the transition when it changes anything.
    pub(crate) fn set_state(&mut self, to: AgentState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(agent = %self.name, %from, %to, "State change");
        self.emit(DomainEvent::AgentStateChanged {
            agent: self.name.clone(),
            from,
            to,
            timestamp: Utc::now(),
        });
    }

    pub(crate) fn emit(&self, event: DomainEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// The system prompt as a message list for an LLM request.
    pub(crate) fn system_messages(&self) -> Vec<Message> {
        self.system_prompt
            .iter()
            .map(|p| Message::system(p.as_str()))
            .collect()
    }

    /// Whether `tool_name` is one of the run-finishing tools.
    pub(crate) fn is_special_tool(&self, tool_name: &str) -> bool {
        let needle = tool_name.to_lowercase();
        self.settings
            .special_tools
            .iter()
            .any(|t| t.to_lowercase() == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;

    fn ctx() -> AgentContext {
        let llm = Llm::new(Arc::new(SequentialMockProvider::new(vec![])), "mock-model");
        AgentContext::new("pilot".into(), llm, AgentSettings::default())
    }

    #[test]
    fn special_tools_match_case_insensitively() {
        let ctx = ctx();
        assert!(ctx.is_special_tool("terminate"));
        assert!(ctx.is_special_tool("Terminate"));
        assert!(!ctx.is_special_tool("bash"));
    }

    #[tokio::test]
    async fn state_changes_are_published_once() {
        let mut ctx = ctx();
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        ctx.events = Some(bus);

        ctx.set_state(AgentState::Running);
        ctx.set_state(AgentState::Running);

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.as_ref(),
            DomainEvent::AgentStateChanged { to: AgentState::Running, .. }
        ));
        assert!(rx.try_recv().is_err());
    }
}
