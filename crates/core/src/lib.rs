//! # taskpilot Core
//!
//! Domain types, traits, and error definitions for the taskpilot agent runtime.
//! This crate has **no framework dependencies** beyond serde and tokio's
//! sync primitives. It defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is defined as a trait here
//! (`Provider`, `Tool`). Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod event;
pub mod llm;
pub mod memory;
pub mod message;
pub mod plan;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentSettings, AgentState, ToolChoice};
pub use error::{AgentError, Error, PlanError, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use llm::{Llm, LlmToolResponse};
pub use memory::Memory;
pub use message::{Message, MessageToolCall, Role};
pub use plan::{Plan, PlanStore, StepStatus};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry, ToolResult};
