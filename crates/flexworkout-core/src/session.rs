//! The running application: one clock, one announcer, both engines.
//!
//! Front ends call the command methods and feed time in with
//! [`Session::advance`]. Speech backends that report completion out of band
//! call [`Session::speech_finished`].

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::narration::{Announcer, AudioOutput, Owner, SpeechToken};
use crate::plan::{flattened_stretches, Plan};
use crate::reminder::{ReminderEngine, ReminderState, ReminderTiming, StretchPool};
use crate::storage::Config;
use crate::timer::{
    PlaybackEngine, PlaybackSnapshot, Progress, Scheduler, TimerHandle, TimerQueue, Wake,
};

/// Shared services handed to an engine for the duration of one call.
pub struct Services<'a> {
    pub scheduler: &'a mut dyn Scheduler,
    pub announcer: &'a mut Announcer,
}

/// Which engine the user is driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Workout,
    Reminder,
}

#[derive(Debug)]
pub struct Session {
    clock: TimerQueue,
    announcer: Announcer,
    playback: PlaybackEngine,
    reminder: ReminderEngine,
    mode: Mode,
}

impl Session {
    pub fn new(playback: PlaybackEngine, reminder: ReminderEngine, announcer: Announcer) -> Self {
        Self {
            clock: TimerQueue::new(),
            announcer,
            playback,
            reminder,
            mode: Mode::Workout,
        }
    }

    /// Wire up a session from user configuration.
    pub fn from_config(plan: Plan, config: &Config, output: Box<dyn AudioOutput>) -> Self {
        let playback = PlaybackEngine::with_timing(plan, config.playback_timing());
        let pool = StretchPool::seeded(flattened_stretches(), config.reminder.seed);
        let reminder = ReminderEngine::new(pool, config.reminder_timing());
        let mut clock = TimerQueue::new();
        let mut announcer = Announcer::new(output)
            .with_cue(config.cue_tone(), Duration::from_millis(config.cues.gap_ms))
            .with_cues_enabled(config.cues.enabled);
        announcer.set_narration_enabled(&mut clock, config.narration.enabled);
        Self {
            clock,
            announcer,
            playback,
            reminder,
            mode: Mode::Workout,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }

    pub fn reminder(&self) -> &ReminderEngine {
        &self.reminder
    }

    pub fn playback_snapshot(&self) -> PlaybackSnapshot {
        self.playback.snapshot()
    }

    pub fn reminder_state(&self) -> ReminderState {
        self.reminder.state()
    }

    pub fn progress(&self) -> Progress {
        self.playback.progress()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn narration_enabled(&self) -> bool {
        self.announcer.narration_enabled()
    }

    /// The utterance currently being spoken, if any.
    pub fn speech_in_flight(&self) -> Option<(Owner, SpeechToken)> {
        self.announcer.in_flight()
    }

    /// Time on the session clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Time until the next timer fires, `None` when nothing is armed.
    pub fn until_next_wake(&self) -> Option<Duration> {
        self.clock.until_next()
    }

    // ── Playback commands ────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.with_playback(|p, svc| p.start(svc))
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.with_playback(|p, svc| p.pause(svc))
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.with_playback(|p, svc| p.reset(svc))
    }

    pub fn jump_to(&mut self, idx: usize) -> Option<Event> {
        self.with_playback(|p, svc| p.jump_to(idx, svc))
    }

    pub fn set_rounds(&mut self, section: &str, rounds: u32) -> Option<Event> {
        self.with_playback(|p, svc| p.set_rounds(section, rounds, svc))
    }

    pub fn load_plan(&mut self, plan: Plan) -> Option<Event> {
        self.with_playback(|p, svc| p.load_plan(plan, svc))
    }

    pub fn toggle_narration(&mut self) -> Option<Event> {
        let enabled = !self.announcer.narration_enabled();
        self.announcer.set_narration_enabled(&mut self.clock, enabled);
        self.deliver_interrupted();
        tracing::debug!(enabled, "narration toggled");
        Some(Event::NarrationToggled {
            enabled,
            at: Utc::now(),
        })
    }

    // ── Reminder commands ────────────────────────────────────────────

    pub fn start_reminder(&mut self) -> Option<Event> {
        self.with_reminder(|r, svc| r.start(svc))
    }

    pub fn stop_reminder(&mut self) -> Option<Event> {
        self.with_reminder(|r, svc| r.stop(svc))
    }

    pub fn set_reminder_interval(&mut self, minutes: u64) -> Option<Event> {
        self.reminder.set_interval(minutes)
    }

    /// Switch the driving mode. Leaving a mode stops its engine: the workout
    /// is paused, the reminder is turned off.
    pub fn set_mode(&mut self, mode: Mode) -> Option<Event> {
        if mode == self.mode {
            return None;
        }
        match self.mode {
            Mode::Workout => {
                self.pause();
            }
            Mode::Reminder => {
                self.stop_reminder();
            }
        }
        self.mode = mode;
        Some(Event::ModeChanged {
            mode,
            at: Utc::now(),
        })
    }

    // ── Time and completion ──────────────────────────────────────────

    /// Move the clock forward by `by`, firing every timer that comes due.
    pub fn advance(&mut self, by: Duration) -> Vec<Event> {
        let target = self.clock.now().saturating_add(by);
        let mut events = Vec::new();
        while let Some((handle, wake)) = self.clock.pop_due(target) {
            events.extend(self.dispatch(handle, wake));
        }
        self.clock.set_now(target);
        events
    }

    /// Report that the utterance `token` finished (or failed). Returns
    /// whether it was still live.
    pub fn speech_finished(&mut self, token: SpeechToken) -> bool {
        match self.announcer.finish(&mut self.clock, token) {
            Some(owner) => self.route_speech_end(owner, token),
            None => {
                tracing::trace!(token = token.0, "stale narration completion ignored");
                false
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, handle: TimerHandle, wake: Wake) -> Option<Event> {
        match wake {
            Wake::Tick(Owner::Playback) => self.with_playback(|p, svc| p.on_tick(svc)),
            Wake::Tick(Owner::Reminder) => self.with_reminder(|r, svc| r.on_tick(svc)),
            Wake::Narrate(Owner::Playback) => {
                self.with_playback(|p, svc| p.on_narrate(handle, svc));
                None
            }
            Wake::Narrate(Owner::Reminder) => {
                self.with_reminder(|r, svc| r.on_narrate(handle, svc));
                None
            }
            Wake::SecondCue => {
                self.announcer.on_second_cue(handle);
                None
            }
            Wake::SpeechDone(token) => {
                self.speech_finished(token);
                None
            }
        }
    }

    fn route_speech_end(&mut self, owner: Owner, token: SpeechToken) -> bool {
        match owner {
            Owner::Playback => self.with_playback(|p, svc| p.on_speech_finished(token, svc)),
            Owner::Reminder => self.with_reminder(|r, svc| r.on_speech_finished(token, svc)),
        }
    }

    fn with_playback<R>(
        &mut self,
        f: impl FnOnce(&mut PlaybackEngine, &mut Services<'_>) -> R,
    ) -> R {
        let mut svc = Services {
            scheduler: &mut self.clock,
            announcer: &mut self.announcer,
        };
        let out = f(&mut self.playback, &mut svc);
        self.deliver_interrupted();
        out
    }

    fn with_reminder<R>(
        &mut self,
        f: impl FnOnce(&mut ReminderEngine, &mut Services<'_>) -> R,
    ) -> R {
        let mut svc = Services {
            scheduler: &mut self.clock,
            announcer: &mut self.announcer,
        };
        let out = f(&mut self.reminder, &mut svc);
        self.deliver_interrupted();
        out
    }

    /// Tell engines whose narration was preempted that it has ended.
    fn deliver_interrupted(&mut self) {
        loop {
            let interrupted = self.announcer.take_interrupted();
            if interrupted.is_empty() {
                break;
            }
            for (owner, token) in interrupted {
                let mut svc = Services {
                    scheduler: &mut self.clock,
                    announcer: &mut self.announcer,
                };
                match owner {
                    Owner::Playback => self.playback.on_speech_finished(token, &mut svc),
                    Owner::Reminder => self.reminder.on_speech_finished(token, &mut svc),
                };
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(
            PlaybackEngine::new(crate::plan::default_plan()),
            ReminderEngine::new(
                StretchPool::seeded(flattened_stretches(), None),
                ReminderTiming::default(),
            ),
            Announcer::default(),
        )
    }
}
