//! Multi-agent orchestration over a shared plan.

pub mod planning;

pub use planning::PlanningFlow;
