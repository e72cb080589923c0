//! An [`AudioOutput`] that records instead of playing. Used by tests and
//! dry runs.

use std::cell::RefCell;
use std::rc::Rc;

use super::output::{AudioOutput, Tone, Utterance};

#[derive(Debug)]
struct Recorded {
    spoken: Vec<String>,
    cancels: usize,
    tones: usize,
    respond_with: Utterance,
}

/// Shared view of everything a [`RecordingOutput`] received.
#[derive(Debug, Clone)]
pub struct AudioLog(Rc<RefCell<Recorded>>);

impl AudioLog {
    pub fn spoken(&self) -> Vec<String> {
        self.0.borrow().spoken.clone()
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.0.borrow().spoken.last().cloned()
    }

    pub fn cancel_count(&self) -> usize {
        self.0.borrow().cancels
    }

    pub fn tone_count(&self) -> usize {
        self.0.borrow().tones
    }

    pub fn clear(&self) {
        let mut r = self.0.borrow_mut();
        r.spoken.clear();
        r.cancels = 0;
        r.tones = 0;
    }

    /// How subsequent `speak` calls report themselves. Defaults to `Pending`.
    pub fn respond_with(&self, utterance: Utterance) {
        self.0.borrow_mut().respond_with = utterance;
    }
}

#[derive(Debug)]
pub struct RecordingOutput {
    log: AudioLog,
}

impl RecordingOutput {
    pub fn new() -> (Self, AudioLog) {
        let log = AudioLog(Rc::new(RefCell::new(Recorded {
            spoken: Vec::new(),
            cancels: 0,
            tones: 0,
            respond_with: Utterance::Pending,
        })));
        (Self { log: log.clone() }, log)
    }
}

impl AudioOutput for RecordingOutput {
    fn speak(&mut self, text: &str) -> Utterance {
        let mut r = self.log.0.borrow_mut();
        r.spoken.push(text.to_string());
        r.respond_with
    }

    fn cancel_speech(&mut self) {
        self.log.0.borrow_mut().cancels += 1;
    }

    fn play_tone(&mut self, _tone: &Tone) {
        self.log.0.borrow_mut().tones += 1;
    }
}
