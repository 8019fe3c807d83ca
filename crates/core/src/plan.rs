//! Step-structured plans and the arena that owns them.
//!
//! A [`Plan`] keeps three parallel vectors (steps, statuses, notes) that are
//! always the same length and addressed by the same positional index. Plans
//! live in a [`PlanStore`] keyed by an opaque plan id and are only mutated
//! through the store's status-transition operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::PlanError;

/// Progress of one plan step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Blocked => "blocked",
        }
    }

    /// Marker used when rendering a plan.
    pub fn glyph(self) -> &'static str {
        match self {
            StepStatus::Completed => "[✓]",
            StepStatus::InProgress => "[→]",
            StepStatus::Blocked => "[!]",
            StepStatus::NotStarted => "[ ]",
        }
    }

    /// Whether a step in this status still needs work.
    pub fn is_open(self) -> bool {
        matches!(self, StepStatus::NotStarted | StepStatus::InProgress)
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(StepStatus::NotStarted),
            "in_progress" => Ok(StepStatus::InProgress),
            "completed" => Ok(StepStatus::Completed),
            "blocked" => Ok(StepStatus::Blocked),
            other => Err(format!("unknown step status '{other}'")),
        }
    }
}

/// A titled, ordered list of steps with per-step status and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub title: String,
    steps: Vec<String>,
    step_statuses: Vec<StepStatus>,
    step_notes: Vec<String>,
}

impl Plan {
    pub fn new(title: impl Into<String>, steps: Vec<String>) -> Self {
        let len = steps.len();
        Self {
            title: title.into(),
            steps,
            step_statuses: vec![StepStatus::NotStarted; len],
            step_notes: vec![String::new(); len],
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn step_statuses(&self) -> &[StepStatus] {
        &self.step_statuses
    }

    pub fn step_notes(&self) -> &[String] {
        &self.step_notes
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn status(&self, index: usize) -> Option<StepStatus> {
        self.step_statuses.get(index).copied()
    }

    pub fn completed_count(&self) -> usize {
        self.step_statuses
            .iter()
            .filter(|s| **s == StepStatus::Completed)
            .count()
    }

    /// Index of the first step that is not started or in progress.
    pub fn next_open_step(&self) -> Option<usize> {
        self.step_statuses.iter().position(|s| s.is_open())
    }

    /// Human-readable plan state used in prompts and summaries.
    pub fn render(&self, plan_id: &str) -> String {
        let completed = self.completed_count();
        let total = self.steps.len();
        let progress = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };

        let mut text = format!("Plan: {} (ID: {plan_id})\n\n", self.title);
        let _ = write!(
            text,
            "Progress: {completed}/{total} steps completed ({progress:.1}%)\n\nSteps:\n"
        );
        for (i, step) in self.steps.iter().enumerate() {
            let status = self.step_statuses.get(i).copied().unwrap_or_default();
            let _ = writeln!(text, "{i}. {} {step}", status.glyph());
            if let Some(note) = self.step_notes.get(i).filter(|n| !n.is_empty()) {
                let _ = writeln!(text, "   Notes: {note}");
            }
        }
        text
    }

    fn check_index(&self, index: usize) -> Result<(), PlanError> {
        if index < self.steps.len() {
            Ok(())
        } else {
            Err(PlanError::InvalidStepIndex {
                index,
                len: self.steps.len(),
            })
        }
    }

    /// Restore the parallel-vector invariant after external edits.
    fn pad(&mut self) {
        let len = self.steps.len();
        self.step_statuses.resize(len, StepStatus::NotStarted);
        self.step_notes.resize(len, String::new());
    }
}

/// Arena of plans addressed by plan id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanStore {
    plans: BTreeMap<String, Plan>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the plan stored under `plan_id`.
    pub fn create(
        &mut self,
        plan_id: impl Into<String>,
        title: impl Into<String>,
        steps: Vec<String>,
    ) -> &Plan {
        let plan_id = plan_id.into();
        self.plans.insert(plan_id.clone(), Plan::new(title, steps));
        &self.plans[&plan_id]
    }

    pub fn get(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.get(plan_id)
    }

    pub fn contains(&self, plan_id: &str) -> bool {
        self.plans.contains_key(plan_id)
    }

    /// Plan ids with their plans, ordered by id.
    pub fn list(&self) -> impl Iterator<Item = (&str, &Plan)> {
        self.plans.iter().map(|(id, plan)| (id.as_str(), plan))
    }

    pub fn delete(&mut self, plan_id: &str) -> Result<Plan, PlanError> {
        self.plans
            .remove(plan_id)
            .ok_or_else(|| PlanError::NotFound(plan_id.to_string()))
    }

    /// Validated status transition. An out-of-range index leaves the plan
    /// unchanged. `status: None` keeps the current status (notes only).
    pub fn mark_step(
        &mut self,
        plan_id: &str,
        index: usize,
        status: Option<StepStatus>,
        notes: Option<String>,
    ) -> Result<StepStatus, PlanError> {
        let plan = self.plan_mut(plan_id)?;
        plan.check_index(index)?;
        plan.pad();
        if let Some(status) = status {
            plan.step_statuses[index] = status;
        }
        if let Some(notes) = notes {
            plan.step_notes[index] = notes;
        }
        Ok(plan.step_statuses[index])
    }

    /// Recovery path used when the step-tracking tool is unavailable: sets
    /// the status directly, padding missing statuses with `NotStarted`.
    pub fn force_status(
        &mut self,
        plan_id: &str,
        index: usize,
        status: StepStatus,
    ) -> Result<(), PlanError> {
        let plan = self.plan_mut(plan_id)?;
        plan.check_index(index)?;
        plan.pad();
        plan.step_statuses[index] = status;
        Ok(())
    }

    /// Retitle a plan and/or replace its steps. Steps whose text is unchanged
    /// at the same position keep their status and notes.
    pub fn update(
        &mut self,
        plan_id: &str,
        title: Option<String>,
        steps: Option<Vec<String>>,
    ) -> Result<&Plan, PlanError> {
        let plan = self.plan_mut(plan_id)?;
        if let Some(title) = title {
            plan.title = title;
        }
        if let Some(new_steps) = steps {
            let mut statuses = Vec::with_capacity(new_steps.len());
            let mut notes = Vec::with_capacity(new_steps.len());
            for (i, step) in new_steps.iter().enumerate() {
                if plan.steps.get(i) == Some(step) {
                    statuses.push(plan.step_statuses.get(i).copied().unwrap_or_default());
                    notes.push(plan.step_notes.get(i).cloned().unwrap_or_default());
                } else {
                    statuses.push(StepStatus::NotStarted);
                    notes.push(String::new());
                }
            }
            plan.steps = new_steps;
            plan.step_statuses = statuses;
            plan.step_notes = notes;
        }
        Ok(plan)
    }

    pub fn render(&self, plan_id: &str) -> Result<String, PlanError> {
        self.plans
            .get(plan_id)
            .map(|plan| plan.render(plan_id))
            .ok_or_else(|| PlanError::NotFound(plan_id.to_string()))
    }

    fn plan_mut(&mut self, plan_id: &str) -> Result<&mut Plan, PlanError> {
        self.plans
            .get_mut(plan_id)
            .ok_or_else(|| PlanError::NotFound(plan_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_steps() -> Vec<String> {
        vec!["Analyze request".into(), "Execute task".into(), "Verify results".into()]
    }

    fn assert_parallel(plan: &Plan) {
        assert_eq!(plan.steps().len(), plan.step_statuses().len());
        assert_eq!(plan.steps().len(), plan.step_notes().len());
    }

    #[test]
    fn create_starts_all_steps_not_started() {
        let mut store = PlanStore::new();
        let plan = store.create("p1", "Demo", default_steps());
        assert!(plan.step_statuses().iter().all(|s| *s == StepStatus::NotStarted));
        assert_parallel(plan);
    }

    #[test]
    fn render_reports_progress() {
        let mut store = PlanStore::new();
        store.create("p1", "Demo", default_steps());
        store.mark_step("p1", 0, Some(StepStatus::Completed), None).unwrap();

        let text = store.render("p1").unwrap();
        assert!(text.starts_with("Plan: Demo (ID: p1)\n\n"));
        assert!(text.contains("1/3 steps completed (33.3%)"));
        assert!(text.contains("0. [✓] Analyze request\n"));
        assert!(text.contains("1. [ ] Execute task\n"));
    }

    #[test]
    fn render_empty_plan_is_zero_percent() {
        let plan = Plan::new("Empty", vec![]);
        assert!(plan.render("p0").contains("0/0 steps completed (0.0%)"));
    }

    #[test]
    fn render_is_idempotent() {
        let mut store = PlanStore::new();
        store.create("p1", "Demo", default_steps());
        store
            .mark_step("p1", 1, Some(StepStatus::Blocked), Some("waiting on access".into()))
            .unwrap();
        let first = store.render("p1").unwrap();
        assert_eq!(first, store.render("p1").unwrap());
        assert!(first.contains("1. [!] Execute task\n   Notes: waiting on access\n"));
    }

    #[test]
    fn out_of_range_mark_leaves_plan_unchanged() {
        let mut store = PlanStore::new();
        store.create("p1", "Demo", default_steps());
        let before = store.get("p1").unwrap().clone();

        let err = store
            .mark_step("p1", 3, Some(StepStatus::Completed), None)
            .unwrap_err();
        assert_eq!(err, PlanError::InvalidStepIndex { index: 3, len: 3 });
        assert_eq!(store.get("p1").unwrap(), &before);
    }

    #[test]
    fn mark_unknown_plan_fails() {
        let mut store = PlanStore::new();
        let err = store.mark_step("nope", 0, None, None).unwrap_err();
        assert_eq!(err, PlanError::NotFound("nope".into()));
    }

    #[test]
    fn force_status_repairs_short_status_vectors() {
        let mut plan = Plan::new("Demo", default_steps());
        plan.step_statuses.truncate(1);
        plan.step_notes.clear();
        let mut store = PlanStore::new();
        store.plans.insert("p1".into(), plan);

        store.force_status("p1", 2, StepStatus::Completed).unwrap();
        let plan = store.get("p1").unwrap();
        assert_parallel(plan);
        assert_eq!(
            plan.step_statuses(),
            &[StepStatus::NotStarted, StepStatus::NotStarted, StepStatus::Completed]
        );
    }

    #[test]
    fn update_keeps_status_of_unchanged_steps() {
        let mut store = PlanStore::new();
        store.create("p1", "Demo", default_steps());
        store.mark_step("p1", 0, Some(StepStatus::Completed), None).unwrap();
        store.mark_step("p1", 1, Some(StepStatus::InProgress), None).unwrap();

        let plan = store
            .update(
                "p1",
                Some("Renamed".into()),
                Some(vec!["Analyze request".into(), "Do something else".into()]),
            )
            .unwrap();
        assert_eq!(plan.title, "Renamed");
        assert_eq!(
            plan.step_statuses(),
            &[StepStatus::Completed, StepStatus::NotStarted]
        );
        assert_parallel(plan);
    }

    #[test]
    fn next_open_step_skips_completed_and_blocked() {
        let mut store = PlanStore::new();
        store.create("p1", "Demo", default_steps());
        store.mark_step("p1", 0, Some(StepStatus::Completed), None).unwrap();
        store.mark_step("p1", 1, Some(StepStatus::Blocked), None).unwrap();
        assert_eq!(store.get("p1").unwrap().next_open_step(), Some(2));

        store.mark_step("p1", 2, Some(StepStatus::Completed), None).unwrap();
        assert_eq!(store.get("p1").unwrap().next_open_step(), None);
    }

    #[test]
    fn status_parsing() {
        assert_eq!("in_progress".parse::<StepStatus>(), Ok(StepStatus::InProgress));
        assert!("done".parse::<StepStatus>().is_err());
    }
}
