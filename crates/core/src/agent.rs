//! Agent lifecycle state and construction-time settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one agent.
///
/// `Idle` is both the initial state and the state after a run that exhausted
/// its step budget. `Finished` and `Error` persist until the caller resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    #[default]
    Idle,
    Running,
    Finished,
    Error,
}

impl AgentState {
    /// Whether the agent must be reset before it can run again.
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Finished | AgentState::Error)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Idle => "IDLE",
            AgentState::Running => "RUNNING",
            AgentState::Finished => "FINISHED",
            AgentState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Whether the model may, must, or must not select tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    None,
    #[default]
    Auto,
    Required,
}

impl ToolChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolChoice::None => "none",
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
        }
    }
}

/// Step-budget and truncation knobs every agent is built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum loop iterations per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Matching prior assistant messages needed to declare the agent stuck
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: usize,

    /// Maximum observation length in characters (None = unlimited)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_observe: Option<usize>,

    /// Tool-choice policy sent with every think request
    #[serde(default)]
    pub tool_choice: ToolChoice,

    /// Tools whose execution finishes the run (matched case-insensitively)
    #[serde(default = "default_special_tools")]
    pub special_tools: Vec<String>,

    /// Messages kept in the agent's memory
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

fn default_max_steps() -> u32 {
    10
}
fn default_duplicate_threshold() -> usize {
    2
}
fn default_special_tools() -> Vec<String> {
    vec!["terminate".into()]
}
fn default_memory_capacity() -> usize {
    crate::memory::DEFAULT_CAPACITY
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            duplicate_threshold: default_duplicate_threshold(),
            max_observe: None,
            tool_choice: ToolChoice::default(),
            special_tools: default_special_tools(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_state_starts_idle() {
        assert_eq!(AgentState::default(), AgentState::Idle);
        assert!(!AgentState::Idle.is_terminal());
        assert!(AgentState::Finished.is_terminal());
    }

    #[test]
    fn tool_choice_serializes_lowercase() {
        let json = serde_json::to_string(&ToolChoice::Required).unwrap();
        assert_eq!(json, "\"required\"");
        let parsed: ToolChoice = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(parsed, ToolChoice::None);
    }

    #[test]
    fn settings_defaults() {
        let settings = AgentSettings::default();
        assert_eq!(settings.max_steps, 10);
        assert_eq!(settings.duplicate_threshold, 2);
        assert!(settings.max_observe.is_none());
        assert_eq!(settings.special_tools, vec!["terminate".to_string()]);
    }
}
