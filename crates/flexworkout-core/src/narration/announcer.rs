//! The process-wide narration and cue service shared by both engines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::output::{AudioOutput, SilentOutput, Tone, Utterance};
use crate::timer::{Scheduler, TimerHandle, Wake};

/// Which engine issued an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Playback,
    Reminder,
}

/// Identifies one utterance. Completions carrying an outdated token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeechToken(pub u64);

/// Result of asking the announcer to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speech {
    /// Already complete; the caller must not wait.
    Done,
    /// Wait for the completion carrying this token.
    Pending(SpeechToken),
}

#[derive(Debug)]
struct InFlight {
    owner: Owner,
    token: SpeechToken,
    done_timer: Option<TimerHandle>,
}

/// Single-utterance speech plus cue playback.
///
/// At most one utterance is in flight. Speaking preempts whatever is in
/// flight; the preempted owner is told its utterance ended (see
/// [`Announcer::take_interrupted`]) so its countdown is not left frozen.
pub struct Announcer {
    output: Box<dyn AudioOutput>,
    narration_enabled: bool,
    cues_enabled: bool,
    cue: Tone,
    cue_gap: Duration,
    next_token: u64,
    in_flight: Option<InFlight>,
    second_cue: Option<TimerHandle>,
    interrupted: Vec<(Owner, SpeechToken)>,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("narration_enabled", &self.narration_enabled)
            .field("cues_enabled", &self.cues_enabled)
            .field("in_flight", &self.in_flight)
            .field("second_cue", &self.second_cue)
            .finish_non_exhaustive()
    }
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new(Box::new(SilentOutput))
    }
}

impl Announcer {
    pub const DEFAULT_CUE_GAP: Duration = Duration::from_millis(300);

    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            narration_enabled: true,
            cues_enabled: true,
            cue: Tone::default(),
            cue_gap: Self::DEFAULT_CUE_GAP,
            next_token: 0,
            in_flight: None,
            second_cue: None,
            interrupted: Vec::new(),
        }
    }

    pub fn with_cue(mut self, cue: Tone, gap: Duration) -> Self {
        self.cue = cue;
        self.cue_gap = gap;
        self
    }

    pub fn with_cues_enabled(mut self, enabled: bool) -> Self {
        self.cues_enabled = enabled;
        self
    }

    pub fn narration_enabled(&self) -> bool {
        self.narration_enabled
    }

    /// Turning narration off cuts the current utterance short and reports it
    /// as ended to its owner.
    pub fn set_narration_enabled(&mut self, scheduler: &mut dyn Scheduler, enabled: bool) {
        self.narration_enabled = enabled;
        if !enabled {
            self.interrupt(scheduler);
        }
    }

    /// Owner of the utterance currently in flight.
    pub fn speaking_owner(&self) -> Option<Owner> {
        self.in_flight.as_ref().map(|f| f.owner)
    }

    pub fn in_flight(&self) -> Option<(Owner, SpeechToken)> {
        self.in_flight.as_ref().map(|f| (f.owner, f.token))
    }

    /// Speak `text` on behalf of `owner`, preempting any utterance in flight.
    pub fn speak(&mut self, scheduler: &mut dyn Scheduler, owner: Owner, text: &str) -> Speech {
        self.interrupt(scheduler);
        if !self.narration_enabled {
            return Speech::Done;
        }

        let token = SpeechToken(self.next_token + 1);
        let done_timer = match self.output.speak(text) {
            Utterance::Finished => return Speech::Done,
            Utterance::Pending => None,
            Utterance::Timed(length) => {
                Some(scheduler.schedule_once(length, Wake::SpeechDone(token)))
            }
        };
        self.next_token = token.0;
        tracing::debug!(?owner, token = token.0, "narration started");
        self.in_flight = Some(InFlight {
            owner,
            token,
            done_timer,
        });
        Speech::Pending(token)
    }

    /// Cancel `owner`'s utterance if it is the one in flight.
    ///
    /// The owner gave up its token, so no completion is reported.
    pub fn cancel_speech(&mut self, scheduler: &mut dyn Scheduler, owner: Owner) {
        if self.in_flight.as_ref().is_some_and(|f| f.owner == owner) {
            if let Some(flight) = self.in_flight.take() {
                if let Some(timer) = flight.done_timer {
                    scheduler.cancel(timer);
                }
                self.output.cancel_speech();
                tracing::debug!(?owner, token = flight.token.0, "narration cancelled");
            }
        }
    }

    /// Resolve a completion. Returns the owner if `token` is the utterance in
    /// flight, `None` if it is stale.
    pub fn finish(&mut self, scheduler: &mut dyn Scheduler, token: SpeechToken) -> Option<Owner> {
        if self.in_flight.as_ref().map(|f| f.token) != Some(token) {
            return None;
        }
        let flight = self.in_flight.take()?;
        if let Some(timer) = flight.done_timer {
            scheduler.cancel(timer);
        }
        Some(flight.owner)
    }

    /// Utterances cut short by another `speak` since the last call.
    pub fn take_interrupted(&mut self) -> Vec<(Owner, SpeechToken)> {
        std::mem::take(&mut self.interrupted)
    }

    pub fn play_cue(&mut self) {
        if self.cues_enabled {
            self.output.play_tone(&self.cue);
        }
    }

    /// Two cues separated by the cue gap. A second cue still pending from an
    /// earlier transition is dropped first.
    pub fn play_double_cue(&mut self, scheduler: &mut dyn Scheduler) {
        self.cancel_cues(scheduler);
        self.play_cue();
        self.second_cue = Some(scheduler.schedule_once(self.cue_gap, Wake::SecondCue));
    }

    /// Fire the pending second cue if `handle` is still the current one.
    pub fn on_second_cue(&mut self, handle: TimerHandle) {
        if self.second_cue == Some(handle) {
            self.second_cue = None;
            self.play_cue();
        }
    }

    pub fn cancel_cues(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.second_cue.take() {
            scheduler.cancel(handle);
        }
    }

    fn interrupt(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(flight) = self.in_flight.take() {
            if let Some(timer) = flight.done_timer {
                scheduler.cancel(timer);
            }
            self.output.cancel_speech();
            self.interrupted.push((flight.owner, flight.token));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::RecordingOutput;
    use crate::timer::TimerQueue;

    fn announcer() -> (Announcer, crate::narration::AudioLog) {
        let (output, log) = RecordingOutput::new();
        (Announcer::new(Box::new(output)), log)
    }

    #[test]
    fn speak_preempts_and_reports_other_owner() {
        let (mut a, log) = announcer();
        let mut q = TimerQueue::new();
        let Speech::Pending(first) = a.speak(&mut q, Owner::Playback, "one") else {
            panic!("expected pending speech");
        };
        let second = a.speak(&mut q, Owner::Reminder, "two");
        assert!(matches!(second, Speech::Pending(t) if t != first));
        assert_eq!(a.take_interrupted(), vec![(Owner::Playback, first)]);
        assert_eq!(log.cancel_count(), 1);
        assert_eq!(a.finish(&mut q, first), None);
    }

    #[test]
    fn disabled_narration_completes_synchronously() {
        let (mut a, log) = announcer();
        let mut q = TimerQueue::new();
        a.set_narration_enabled(&mut q, false);
        assert_eq!(a.speak(&mut q, Owner::Playback, "hello"), Speech::Done);
        assert!(log.spoken().is_empty());
    }

    #[test]
    fn timed_utterance_schedules_completion() {
        let (mut a, log) = announcer();
        log.respond_with(Utterance::Timed(Duration::from_secs(2)));
        let mut q = TimerQueue::new();
        let Speech::Pending(token) = a.speak(&mut q, Owner::Playback, "hi") else {
            panic!("expected pending speech");
        };
        let (_, wake) = q.pop_due(Duration::from_secs(2)).unwrap();
        assert_eq!(wake, Wake::SpeechDone(token));
        assert_eq!(a.finish(&mut q, token), Some(Owner::Playback));
        assert_eq!(a.finish(&mut q, token), None);
    }

    #[test]
    fn cancel_only_touches_own_utterance() {
        let (mut a, _log) = announcer();
        let mut q = TimerQueue::new();
        a.speak(&mut q, Owner::Reminder, "stretch");
        a.cancel_speech(&mut q, Owner::Playback);
        assert_eq!(a.speaking_owner(), Some(Owner::Reminder));
        a.cancel_speech(&mut q, Owner::Reminder);
        a.cancel_speech(&mut q, Owner::Reminder);
        assert_eq!(a.speaking_owner(), None);
        assert!(a.take_interrupted().is_empty());
    }

    #[test]
    fn double_cue_replaces_pending_second_cue() {
        let (mut a, log) = announcer();
        let mut q = TimerQueue::new();
        a.play_double_cue(&mut q);
        a.play_double_cue(&mut q);
        assert_eq!(log.tone_count(), 2);
        assert_eq!(q.len(), 1);

        let (handle, wake) = q.pop_due(Duration::from_millis(300)).unwrap();
        assert_eq!(wake, Wake::SecondCue);
        a.on_second_cue(handle);
        a.on_second_cue(handle);
        assert_eq!(log.tone_count(), 3);
    }
}
