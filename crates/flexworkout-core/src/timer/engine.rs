//! Workout playback engine.
//!
//! A state machine over the flat step sequence. It owns no threads and no
//! clock: countdown ticks and delayed narration arrive as timers fired by the
//! session's [`Scheduler`], and narration completion arrives as a token.
//!
//! ## State Transitions
//!
//! ```text
//! Idle/Paused --start--> Speaking --speech done--> Running --expire--> Speaking ...
//!      ^                    |                         |                  |
//!      +------pause---------+------------pause--------+                  |
//!                                     last step expires --> Finished <---+
//! ```
//!
//! While speaking the countdown is frozen. Only the narration completion
//! unfreezes it; pause and reset force it off as a cancellation.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PlaybackEngine::new(default_plan());
//! engine.start(&mut services);
//! // timers fire through the session:
//! engine.on_tick(&mut services); // Some(Event) when a step advances
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::progress::Progress;
use super::scheduler::{TimerHandle, Wake};
use crate::events::Event;
use crate::narration::{Owner, Speech, SpeechToken};
use crate::plan::{build_sequence, total_secs, Plan, PlanStep, RoundsConfig, Section};
use crate::session::Services;

const OWNER: Owner = Owner::Playback;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Idle,
    Running,
    /// Running, but the countdown is frozen on narration.
    Speaking,
    Paused,
    Finished,
}

/// Raw playback flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_index: usize,
    pub time_left_secs: u64,
    pub is_running: bool,
    pub is_speaking: bool,
    pub is_finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    pub tick: Duration,
    /// Pause between the transition cue and the next step's narration.
    pub transition_delay: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            transition_delay: Duration::from_secs(1),
        }
    }
}

/// Read-only view for front ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub state: PlaybackState,
    pub step: Option<PlanStep>,
    pub section_tips: Option<String>,
    pub step_count: usize,
    pub progress: Progress,
}

#[derive(Debug)]
pub struct PlaybackEngine {
    plan: Plan,
    rounds: RoundsConfig,
    steps: Vec<PlanStep>,
    index: usize,
    time_left: u64,
    running: bool,
    speaking: bool,
    finished: bool,
    /// Set by the first start since the last reset.
    started: bool,
    timing: PlaybackTiming,
    speech: Option<SpeechToken>,
    tick: Option<TimerHandle>,
    narrate: Option<TimerHandle>,
}

impl PlaybackEngine {
    pub fn new(plan: Plan) -> Self {
        Self::with_timing(plan, PlaybackTiming::default())
    }

    /// Starts idle on the first step, rounds at each section's default.
    pub fn with_timing(plan: Plan, timing: PlaybackTiming) -> Self {
        let rounds = RoundsConfig::defaults_for(&plan);
        let steps = build_sequence(&plan, &rounds);
        let time_left = steps.first().map(|s| s.duration_secs).unwrap_or(0);
        Self {
            plan,
            rounds,
            steps,
            index: 0,
            time_left,
            running: false,
            speaking: false,
            finished: false,
            started: false,
            timing,
            speech: None,
            tick: None,
            narrate: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_index: self.index,
            time_left_secs: self.time_left,
            is_running: self.running,
            is_speaking: self.speaking,
            is_finished: self.finished,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.finished {
            PlaybackStatus::Finished
        } else if self.running && self.speaking {
            PlaybackStatus::Speaking
        } else if self.running {
            PlaybackStatus::Running
        } else if !self.started {
            PlaybackStatus::Idle
        } else {
            PlaybackStatus::Paused
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn rounds(&self) -> &RoundsConfig {
        &self.rounds
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn current_step(&self) -> Option<&PlanStep> {
        self.steps.get(self.index)
    }

    pub fn current_section(&self) -> Option<&Section> {
        self.current_step().and_then(|s| self.plan.section(&s.section))
    }

    pub fn progress(&self) -> Progress {
        Progress::compute(&self.steps, self.index, self.time_left)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status(),
            state: self.state(),
            step: self.current_step().cloned(),
            section_tips: self
                .current_section()
                .map(|s| s.tips.clone())
                .filter(|t| !t.is_empty()),
            step_count: self.steps.len(),
            progress: self.progress(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        let step = self.current_step();
        Event::StateSnapshot {
            status: self.status(),
            step_index: self.index,
            step_name: step.map(|s| s.name.clone()).unwrap_or_default(),
            section: step.map(|s| s.section.clone()).unwrap_or_default(),
            remaining_secs: self.time_left,
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume. Starting a finished workout restarts it from the top.
    pub fn start(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        if self.steps.is_empty() {
            tracing::warn!("start ignored: plan has no steps");
            return None;
        }
        if self.finished {
            return self.reset(svc);
        }
        if self.running {
            return None;
        }

        self.running = true;
        self.started = true;
        self.announce_current(svc);
        tracing::debug!(step = self.index, remaining = self.time_left, "playback started");
        let step = self.current_step()?;
        Some(Event::PlaybackStarted {
            step_index: self.index,
            step_name: step.name.clone(),
            remaining_secs: self.time_left,
            at: Utc::now(),
        })
    }

    /// Stop the countdown, keeping the remaining seconds as they are.
    pub fn pause(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.cancel_pending(svc);
        tracing::debug!(step = self.index, remaining = self.time_left, "playback paused");
        Some(Event::PlaybackPaused {
            step_index: self.index,
            remaining_secs: self.time_left,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        self.cancel_pending(svc);
        self.running = false;
        self.finished = false;
        self.started = false;
        self.index = 0;
        self.time_left = self.full_duration(0).unwrap_or(0);
        tracing::debug!("playback reset");
        Some(Event::PlaybackReset { at: Utc::now() })
    }

    /// Jump to an arbitrary step.
    ///
    /// While running the target starts over at full length and is narrated
    /// at once, replacing any delayed transition narration. While paused,
    /// re-selecting the current step keeps its remaining time.
    pub fn jump_to(&mut self, idx: usize, svc: &mut Services<'_>) -> Option<Event> {
        let Some(full) = self.full_duration(idx) else {
            tracing::warn!(idx, len = self.steps.len(), "jump ignored: no such step");
            return None;
        };
        let from = self.index;

        if self.running {
            self.cancel_narrate(svc);
            self.index = idx;
            self.time_left = full;
            self.announce_current(svc);
        } else {
            if idx != from || self.finished {
                self.time_left = full;
            }
            self.finished = false;
            self.index = idx;
        }

        tracing::debug!(from, to = idx, remaining = self.time_left, "jumped");
        Some(Event::StepJumped {
            from_step: from,
            to_step: idx,
            remaining_secs: self.time_left,
            at: Utc::now(),
        })
    }

    /// Change how many rounds a section plays. Refused while running and for
    /// sections without rounds; the count is clamped to `1..=max_rounds`.
    /// Playback is fully reset afterwards.
    pub fn set_rounds(
        &mut self,
        section: &str,
        rounds: u32,
        svc: &mut Services<'_>,
    ) -> Option<Event> {
        if self.running {
            tracing::warn!(section, "rounds change refused while running");
            return None;
        }
        let max = match self.plan.section(section) {
            Some(s) if s.allow_rounds => s.max_rounds.max(1),
            _ => {
                tracing::warn!(section, "rounds change ignored: section has no rounds");
                return None;
            }
        };
        let rounds = rounds.clamp(1, max);
        self.rounds.set(section, rounds);
        self.steps = build_sequence(&self.plan, &self.rounds);
        self.reset(svc);
        Some(Event::RoundsChanged {
            section: section.to_string(),
            rounds,
            steps: self.steps.len(),
            at: Utc::now(),
        })
    }

    /// Replace the plan. Rounds go back to defaults and playback resets.
    pub fn load_plan(&mut self, plan: Plan, svc: &mut Services<'_>) -> Option<Event> {
        self.rounds = RoundsConfig::defaults_for(&plan);
        self.steps = build_sequence(&plan, &self.rounds);
        self.plan = plan;
        self.reset(svc);
        Some(Event::PlanLoaded {
            steps: self.steps.len(),
            total_secs: total_secs(&self.steps),
            at: Utc::now(),
        })
    }

    // ── Timer and narration callbacks ────────────────────────────────

    /// One countdown second. Returns an event when the step expires.
    pub fn on_tick(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        if !self.running || self.speaking || self.time_left == 0 {
            return None;
        }
        self.time_left -= 1;
        tracing::trace!(step = self.index, remaining = self.time_left, "tick");
        if self.time_left == 0 {
            return Some(self.advance(svc));
        }
        None
    }

    /// The post-cue delay elapsed: narrate the step we advanced to.
    pub fn on_narrate(&mut self, handle: TimerHandle, svc: &mut Services<'_>) {
        if self.narrate != Some(handle) {
            return;
        }
        self.narrate = None;
        if self.running {
            self.announce_current(svc);
        }
    }

    /// Narration ended (normally or cut short). Stale tokens are ignored.
    pub fn on_speech_finished(&mut self, token: SpeechToken, svc: &mut Services<'_>) -> bool {
        if self.speech != Some(token) {
            return false;
        }
        self.speech = None;
        self.resume_countdown(svc);
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn full_duration(&self, idx: usize) -> Option<u64> {
        self.steps.get(idx).map(|s| s.duration_secs)
    }

    fn advance(&mut self, svc: &mut Services<'_>) -> Event {
        let from = self.index;
        svc.announcer.play_double_cue(svc.scheduler);
        self.stop_tick(svc);

        let Some(next) = self.steps.get(from + 1).cloned() else {
            self.running = false;
            self.finished = true;
            tracing::debug!(steps = self.steps.len(), "workout finished");
            return Event::WorkoutFinished {
                total_secs: total_secs(&self.steps),
                at: Utc::now(),
            };
        };

        self.index = from + 1;
        self.time_left = next.duration_secs;
        // Frozen for the whole delay + speech window, narration on or off.
        self.speaking = true;
        self.cancel_narrate(svc);
        self.narrate = Some(
            svc.scheduler
                .schedule_once(self.timing.transition_delay, Wake::Narrate(OWNER)),
        );
        tracing::debug!(from, to = self.index, "step advanced");
        Event::StepAdvanced {
            from_step: from,
            to_step: self.index,
            step_name: next.name,
            section: next.section,
            duration_secs: next.duration_secs,
            at: Utc::now(),
        }
    }

    fn announce_current(&mut self, svc: &mut Services<'_>) {
        let Some(text) = self.current_step().map(PlanStep::announcement) else {
            return;
        };
        self.speaking = true;
        self.stop_tick(svc);
        match svc.announcer.speak(svc.scheduler, OWNER, &text) {
            Speech::Done => self.resume_countdown(svc),
            Speech::Pending(token) => self.speech = Some(token),
        }
    }

    fn resume_countdown(&mut self, svc: &mut Services<'_>) {
        self.speaking = false;
        self.speech = None;
        if self.running && self.time_left > 0 && self.tick.is_none() {
            self.tick = Some(
                svc.scheduler
                    .schedule_repeating(self.timing.tick, Wake::Tick(OWNER)),
            );
        }
    }

    fn stop_tick(&mut self, svc: &mut Services<'_>) {
        if let Some(handle) = self.tick.take() {
            svc.scheduler.cancel(handle);
        }
    }

    fn cancel_narrate(&mut self, svc: &mut Services<'_>) {
        if let Some(handle) = self.narrate.take() {
            svc.scheduler.cancel(handle);
        }
    }

    fn cancel_pending(&mut self, svc: &mut Services<'_>) {
        self.stop_tick(svc);
        self.cancel_narrate(svc);
        svc.announcer.cancel_speech(svc.scheduler, OWNER);
        svc.announcer.cancel_cues(svc.scheduler);
        self.speech = None;
        self.speaking = false;
    }
}
