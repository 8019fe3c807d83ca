//! Shared test helpers for agent and flow tests.

use std::sync::{Arc, Mutex};
use taskpilot_core::error::ProviderError;
use taskpilot_core::message::{Message, MessageToolCall};
use taskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use taskpilot_core::{Llm, ToolRegistry};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue. Once the
/// queue is drained it either repeats the last response (see
/// [`SequentialMockProvider::repeat_last`]) or fails with an API error.
pub struct SequentialMockProvider {
    responses: Vec<ProviderResponse>,
    repeat_last: bool,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses,
            repeat_last: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn repeat_last(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        let response = match self.responses.get(index) {
            Some(r) => Some(r),
            None if self.repeat_last => self.responses.last(),
            None => None,
        };
        response.cloned().ok_or_else(|| ProviderError::ApiError {
            status_code: 500,
            message: format!("no scripted response for call #{index}"),
        })
    }
}

/// Wrap a scripted provider into an LLM gateway.
pub fn mock_llm(provider: &Arc<SequentialMockProvider>) -> Llm {
    Llm::new(provider.clone(), "mock-model")
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    make_tool_call_response(Vec::new(), text)
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::from_tool_calls(tool_calls, thought),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall::new(format!("call_{name}"), name, args.to_string())
}

/// A registry holding only the `terminate` tool.
pub fn terminate_only() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(taskpilot_tools::TerminateTool));
    Arc::new(registry)
}
