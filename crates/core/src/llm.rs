//! LLM gateway — the stateless request/response boundary to a model.
//!
//! Wraps a [`Provider`] with the model settings an agent was built with and
//! exposes the two shapes the agent loop needs: plain completion and
//! completion with tool selection.

use std::sync::Arc;
use tracing::debug;

use crate::agent::ToolChoice;
use crate::error::ProviderError;
use crate::message::{Message, MessageToolCall};
use crate::provider::{Provider, ProviderRequest, ToolDefinition};

/// Model-facing half of an agent.
#[derive(Clone)]
pub struct Llm {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

/// Text and tool calls returned by [`Llm::ask_tool`].
#[derive(Debug, Clone, Default)]
pub struct LlmToolResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<MessageToolCall>,
}

impl Llm {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 1.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Plain completion; returns the reply text (empty when the model sent none).
    pub async fn ask(
        &self,
        messages: &[Message],
        system_messages: &[Message],
    ) -> Result<String, ProviderError> {
        let request = self.request(messages, system_messages, Vec::new(), None);
        let response = self.provider.complete(request).await?;
        Ok(response.message.content.unwrap_or_default())
    }

    /// Completion where the model may select tools under `tool_choice`.
    pub async fn ask_tool(
        &self,
        messages: &[Message],
        system_messages: &[Message],
        tools: Vec<ToolDefinition>,
        tool_choice: ToolChoice,
    ) -> Result<LlmToolResponse, ProviderError> {
        let request = self.request(messages, system_messages, tools, Some(tool_choice));
        let response = self.provider.complete(request).await?;
        debug!(
            model = %response.model,
            tool_calls = response.message.tool_calls.len(),
            "Tool completion received"
        );
        Ok(LlmToolResponse {
            content: response.message.content,
            tool_calls: response.message.tool_calls,
        })
    }

    fn request(
        &self,
        messages: &[Message],
        system_messages: &[Message],
        tools: Vec<ToolDefinition>,
        tool_choice: Option<ToolChoice>,
    ) -> ProviderRequest {
        let mut all = Vec::with_capacity(system_messages.len() + messages.len());
        all.extend_from_slice(system_messages);
        all.extend_from_slice(messages);
        ProviderRequest {
            model: self.model.clone(),
            messages: all,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
            tool_choice,
        }
    }
}

impl std::fmt::Debug for Llm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Llm")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::provider::ProviderResponse;
    use std::sync::Mutex;

    /// Echoes the request back and remembers it.
    struct RecordingProvider {
        last: Mutex<Option<ProviderRequest>>,
    }

    #[async_trait::async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let reply = format!("{} messages", request.messages.len());
            *self.last.lock().unwrap() = Some(request);
            let mut message = Message::assistant(reply);
            message.tool_calls = vec![MessageToolCall::new("call_1", "terminate", "{}")];
            Ok(ProviderResponse {
                message,
                usage: None,
                model: "recording-model".into(),
            })
        }
    }

    fn llm() -> (Arc<RecordingProvider>, Llm) {
        let provider = Arc::new(RecordingProvider {
            last: Mutex::new(None),
        });
        let llm = Llm::new(provider.clone(), "test-model").with_max_tokens(256);
        (provider, llm)
    }

    #[tokio::test]
    async fn ask_puts_system_messages_first() {
        let (provider, llm) = llm();
        let reply = llm
            .ask(&[Message::user("hello")], &[Message::system("be brief")])
            .await
            .unwrap();
        assert_eq!(reply, "2 messages");

        let request = provider.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert!(request.tool_choice.is_none());
        assert_eq!(request.max_tokens, Some(256));
    }

    #[tokio::test]
    async fn ask_tool_forwards_policy_and_returns_calls() {
        let (provider, llm) = llm();
        let response = llm
            .ask_tool(&[Message::user("go")], &[], Vec::new(), ToolChoice::Required)
            .await
            .unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "terminate");

        let request = provider.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.tool_choice, Some(ToolChoice::Required));
        assert_eq!(request.model, "test-model");
    }
}
