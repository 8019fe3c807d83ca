//! The agent runtime for taskpilot.
//!
//! An [`Agent`] is a bounded state machine: each step *thinks* (asks the
//! model, possibly for tool calls) and then *acts* (dispatches the selected
//! tools in order, recording every observation in memory). The loop ends
//! when a special tool such as `terminate` runs, when the step budget is
//! spent, or when a step fails.
//!
//! A [`PlanningFlow`] sits above one or more agents: it has the model draft
//! a plan, then hands each open step to an executor agent and tracks step
//! status until nothing is left open.

pub mod agent;
mod context;
pub mod flow;
pub mod presets;
pub mod prompt;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::Agent;
pub use flow::PlanningFlow;
pub use presets::{PILOT, pilot_agent, pilot_flow};
pub use strategy::{Strategy, ToolCallStrategy};
