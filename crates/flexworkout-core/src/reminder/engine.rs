//! Periodic break reminders.
//!
//! Counts down a fixed interval, then runs a three-step stretch break with
//! a cue and narration between steps. Uses the same freeze-while-speaking
//! rule as the playback engine.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::pool::StretchPool;
use crate::events::Event;
use crate::narration::{Owner, Speech, SpeechToken};
use crate::plan::Stretch;
use crate::session::Services;
use crate::timer::{TimerHandle, Wake};

const OWNER: Owner = Owner::Reminder;

/// Stretches per break.
pub const BREAK_STEPS: usize = 3;

/// Interval length for `minutes`, at least one minute and saturating on
/// absurd values.
pub fn interval_secs(minutes: u64) -> u64 {
    minutes.max(1).saturating_mul(60)
}

const ENABLED_LINE: &str = "Break reminders are on.";
const CLOSING_LINE: &str = "Break over, back to work.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTiming {
    pub interval_secs: u64,
    pub break_step_secs: u64,
    pub tick: Duration,
    pub transition_delay: Duration,
}

impl Default for ReminderTiming {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
            break_step_secs: 30,
            tick: Duration::from_secs(1),
            transition_delay: Duration::from_secs(1),
        }
    }
}

/// Read-only view of the reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderState {
    pub interval_secs: u64,
    pub time_left_secs: u64,
    pub is_running: bool,
    pub is_speaking: bool,
    pub is_break_active: bool,
    pub break_step_index: usize,
    pub break_time_left_secs: u64,
    pub stretch_pool: Vec<Stretch>,
    pub last_suggested: Vec<Stretch>,
}

#[derive(Debug)]
pub struct ReminderEngine {
    timing: ReminderTiming,
    time_left: u64,
    running: bool,
    speaking: bool,
    break_active: bool,
    break_index: usize,
    break_time_left: u64,
    pool: StretchPool,
    last_suggested: Vec<Stretch>,
    speech: Option<SpeechToken>,
    tick: Option<TimerHandle>,
    narrate: Option<TimerHandle>,
}

impl ReminderEngine {
    pub fn new(pool: StretchPool, timing: ReminderTiming) -> Self {
        Self {
            time_left: timing.interval_secs,
            break_time_left: timing.break_step_secs,
            timing,
            running: false,
            speaking: false,
            break_active: false,
            break_index: 0,
            pool,
            last_suggested: Vec::new(),
            speech: None,
            tick: None,
            narrate: None,
        }
    }

    pub fn state(&self) -> ReminderState {
        ReminderState {
            interval_secs: self.timing.interval_secs,
            time_left_secs: self.time_left,
            is_running: self.running,
            is_speaking: self.speaking,
            is_break_active: self.break_active,
            break_step_index: self.break_index,
            break_time_left_secs: self.break_time_left,
            stretch_pool: self.pool.items(),
            last_suggested: self.last_suggested.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The stretch for the current break step, if a break is on.
    pub fn current_stretch(&self) -> Option<&Stretch> {
        if self.break_active {
            self.last_suggested.get(self.break_index)
        } else {
            None
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        self.break_active = false;
        self.break_index = 0;
        self.time_left = self.timing.interval_secs;
        self.announce(ENABLED_LINE, svc);
        tracing::debug!(interval = self.timing.interval_secs, "reminder started");
        Some(Event::ReminderStarted {
            interval_secs: self.timing.interval_secs,
            at: Utc::now(),
        })
    }

    /// Turn reminders off. Clears any break but keeps the last suggestions.
    pub fn stop(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        if !self.running && !self.break_active {
            return None;
        }
        self.running = false;
        self.stop_tick(svc);
        self.cancel_narrate(svc);
        svc.announcer.cancel_speech(svc.scheduler, OWNER);
        svc.announcer.cancel_cues(svc.scheduler);
        self.speech = None;
        self.speaking = false;
        self.break_active = false;
        self.break_index = 0;
        self.break_time_left = self.timing.break_step_secs;
        self.time_left = self.timing.interval_secs;
        tracing::debug!("reminder stopped");
        Some(Event::ReminderStopped { at: Utc::now() })
    }

    /// Set the interval in minutes (at least one). The countdown restarts
    /// from the new interval unless a break is on, in which case the new
    /// interval applies once the break ends.
    pub fn set_interval(&mut self, minutes: u64) -> Option<Event> {
        let secs = interval_secs(minutes);
        self.timing.interval_secs = secs;
        if !self.break_active {
            self.time_left = secs;
        }
        Some(Event::ReminderIntervalChanged {
            interval_secs: secs,
            at: Utc::now(),
        })
    }

    // ── Timer and narration callbacks ────────────────────────────────

    pub fn on_tick(&mut self, svc: &mut Services<'_>) -> Option<Event> {
        if !self.running || self.speaking {
            return None;
        }
        if self.break_active {
            self.break_time_left = self.break_time_left.saturating_sub(1);
            if self.break_time_left == 0 {
                return Some(self.next_break_step(svc));
            }
        } else {
            self.time_left = self.time_left.saturating_sub(1);
            if self.time_left == 0 {
                return Some(self.begin_break(svc));
            }
        }
        None
    }

    pub fn on_narrate(&mut self, handle: TimerHandle, svc: &mut Services<'_>) {
        if self.narrate != Some(handle) {
            return;
        }
        self.narrate = None;
        if !self.running {
            return;
        }
        let line = match self.current_stretch() {
            Some(s) => format!("Next move: {}. {}", s.name, s.desc),
            None if self.break_active => "Keep moving.".to_string(),
            None => CLOSING_LINE.to_string(),
        };
        self.announce(&line, svc);
    }

    pub fn on_speech_finished(&mut self, token: SpeechToken, svc: &mut Services<'_>) -> bool {
        if self.speech != Some(token) {
            return false;
        }
        self.speech = None;
        self.resume_countdown(svc);
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_break(&mut self, svc: &mut Services<'_>) -> Event {
        self.break_active = true;
        self.break_index = 0;
        self.break_time_left = self.timing.break_step_secs;
        svc.announcer.play_double_cue(svc.scheduler);

        self.last_suggested = self.pool.draw(BREAK_STEPS);
        let line = match self.last_suggested.first() {
            Some(s) => format!("Break time. First move: {}. {}", s.name, s.desc),
            None => "Break time. Stand up and move around.".to_string(),
        };
        self.cancel_narrate(svc);
        self.announce(&line, svc);
        tracing::debug!(suggested = self.last_suggested.len(), "break started");
        Event::BreakStarted {
            suggestions: self.last_suggested.clone(),
            at: Utc::now(),
        }
    }

    fn next_break_step(&mut self, svc: &mut Services<'_>) -> Event {
        svc.announcer.play_double_cue(svc.scheduler);
        self.stop_tick(svc);
        self.speaking = true;
        self.cancel_narrate(svc);
        self.narrate = Some(
            svc.scheduler
                .schedule_once(self.timing.transition_delay, Wake::Narrate(OWNER)),
        );

        if self.break_index + 1 >= BREAK_STEPS {
            self.break_active = false;
            self.break_index = 0;
            self.break_time_left = self.timing.break_step_secs;
            self.time_left = self.timing.interval_secs;
            tracing::debug!("break ended");
            return Event::BreakEnded {
                next_reminder_secs: self.time_left,
                at: Utc::now(),
            };
        }

        self.break_index += 1;
        self.break_time_left = self.timing.break_step_secs;
        tracing::debug!(step = self.break_index, "break step advanced");
        Event::BreakStepAdvanced {
            break_step: self.break_index,
            stretch: self.current_stretch().cloned(),
            at: Utc::now(),
        }
    }

    fn announce(&mut self, text: &str, svc: &mut Services<'_>) {
        self.speaking = true;
        self.stop_tick(svc);
        match svc.announcer.speak(svc.scheduler, OWNER, text) {
            Speech::Done => self.resume_countdown(svc),
            Speech::Pending(token) => self.speech = Some(token),
        }
    }

    fn resume_countdown(&mut self, svc: &mut Services<'_>) {
        self.speaking = false;
        self.speech = None;
        if self.running && self.tick.is_none() {
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
}
