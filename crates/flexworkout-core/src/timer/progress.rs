//! Derived progress figures. Nothing here is stored.

use serde::{Deserialize, Serialize};

use crate::plan::{total_secs, PlanStep};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub remaining_total_secs: u64,
    /// 0.0 ..= 100.0
    pub percent: f64,
}

impl Progress {
    /// Progress through `steps` with `time_left` seconds remaining in the
    /// step at `index`.
    pub fn compute(steps: &[PlanStep], index: usize, time_left: u64) -> Self {
        let total = total_secs(steps);
        let Some(current) = steps.get(index) else {
            return Self {
                elapsed_secs: 0,
                total_secs: total,
                remaining_total_secs: 0,
                percent: 0.0,
            };
        };

        let before: u64 = steps[..index].iter().map(|s| s.duration_secs).sum();
        let after: u64 = steps[index + 1..].iter().map(|s| s.duration_secs).sum();
        let elapsed = before + current.duration_secs.saturating_sub(time_left);
        let percent = if total == 0 {
            0.0
        } else {
            elapsed as f64 / total as f64 * 100.0
        };

        Self {
            elapsed_secs: elapsed,
            total_secs: total,
            remaining_total_secs: time_left + after,
            percent,
        }
    }
}
