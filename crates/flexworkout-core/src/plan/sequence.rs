//! Flattening of a sectioned plan into the playable step sequence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::Plan;

/// A playable step, tagged with the section it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub name: String,
    pub desc: String,
    /// Duration in seconds.
    pub duration_secs: u64,
    pub section: String,
}

impl PlanStep {
    /// Text spoken when this step begins.
    pub fn announcement(&self) -> String {
        if self.desc.is_empty() {
            format!("{}.", self.name)
        } else {
            format!("{}. {}", self.name, self.desc)
        }
    }
}

/// Per-section round overrides, keyed by section name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundsConfig(BTreeMap<String, u32>);

impl RoundsConfig {
    /// Each section at its `default_rounds`.
    pub fn defaults_for(plan: &Plan) -> Self {
        Self(
            plan.sections
                .iter()
                .map(|s| (s.name.clone(), s.default_rounds))
                .collect(),
        )
    }

    pub fn get(&self, section: &str) -> Option<u32> {
        self.0.get(section).copied()
    }

    pub fn set(&mut self, section: impl Into<String>, rounds: u32) {
        self.0.insert(section.into(), rounds);
    }
}

/// Build the flat step sequence for `plan` under `rounds`.
///
/// For each section in order, its steps are appended `effective_rounds`
/// times. Steps are cloned, never shared.
pub fn build_sequence(plan: &Plan, rounds: &RoundsConfig) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    for section in &plan.sections {
        let n = section.effective_rounds(rounds.get(&section.name));
        for _ in 0..n {
            steps.extend(section.steps.iter().map(|s| PlanStep {
                name: s.name.clone(),
                desc: s.desc.clone(),
                duration_secs: s.duration,
                section: section.name.clone(),
            }));
        }
    }
    steps
}

/// Sum of all step durations in seconds.
pub fn total_secs(steps: &[PlanStep]) -> u64 {
    steps.iter().map(|s| s.duration_secs).sum()
}
