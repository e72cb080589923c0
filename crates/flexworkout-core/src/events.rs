use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::Stretch;
use crate::session::Mode;
use crate::timer::{PlaybackStatus, Progress};

/// Every state change in the system produces an Event.
/// Front ends print or render them; nothing in the core consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PlanLoaded {
        steps: usize,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    RoundsChanged {
        section: String,
        rounds: u32,
        steps: usize,
        at: DateTime<Utc>,
    },
    PlaybackStarted {
        step_index: usize,
        step_name: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PlaybackPaused {
        step_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PlaybackReset {
        at: DateTime<Utc>,
    },
    StepAdvanced {
        from_step: usize,
        to_step: usize,
        step_name: String,
        section: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    StepJumped {
        from_step: usize,
        to_step: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    WorkoutFinished {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    NarrationToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: Mode,
        at: DateTime<Utc>,
    },
    ReminderStarted {
        interval_secs: u64,
        at: DateTime<Utc>,
    },
    ReminderStopped {
        at: DateTime<Utc>,
    },
    ReminderIntervalChanged {
        interval_secs: u64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        suggestions: Vec<Stretch>,
        at: DateTime<Utc>,
    },
    BreakStepAdvanced {
        break_step: usize,
        stretch: Option<Stretch>,
        at: DateTime<Utc>,
    },
    BreakEnded {
        next_reminder_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: PlaybackStatus,
        step_index: usize,
        step_name: String,
        section: String,
        remaining_secs: u64,
        progress: Progress,
        at: DateTime<Utc>,
    },
}
