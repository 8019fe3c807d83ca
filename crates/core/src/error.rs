//! Error types for the taskpilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all taskpilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent lifecycle errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Plan errors ---
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Contract violations of the agent state machine and the plan orchestrator.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Cannot run agent from state: {state}")]
    InvalidState { state: String },

    #[error("Tool calls required but none provided")]
    ToolCallsRequired,

    #[error("No primary agent available")]
    NoPrimaryAgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Plan {0} not found")]
    NotFound(String),

    #[error("Invalid step index {index}: plan has {len} steps")]
    InvalidStepIndex { index: usize, len: usize },

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Unknown command {0}")]
    UnknownCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn invalid_state_names_the_state() {
        let err = Error::from(AgentError::InvalidState {
            state: "RUNNING".into(),
        });
        assert!(err.to_string().contains("Cannot run agent from state: RUNNING"));
    }

    #[test]
    fn plan_index_error_reports_bounds() {
        let err = PlanError::InvalidStepIndex { index: 7, len: 3 };
        assert_eq!(err.to_string(), "Invalid step index 7: plan has 3 steps");
    }
}
