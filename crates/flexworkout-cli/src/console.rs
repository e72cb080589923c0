//! Terminal stand-in for a speech engine: narration is printed to stderr and
//! "lasts" as long as reading it aloud would.

use std::io::Write;
use std::time::Duration;

use flexworkout_core::narration::{AudioOutput, Tone, Utterance};

pub struct ConsoleOutput {
    chars_per_second: f64,
}

impl ConsoleOutput {
    pub fn new(chars_per_second: f64) -> Self {
        Self { chars_per_second }
    }

    fn reading_time(&self, text: &str) -> Option<Duration> {
        if !self.chars_per_second.is_finite() || self.chars_per_second <= 0.0 {
            return None;
        }
        let chars = text.chars().count() as f64;
        Some(Duration::from_secs_f64(chars / self.chars_per_second))
    }
}

impl AudioOutput for ConsoleOutput {
    fn speak(&mut self, text: &str) -> Utterance {
        eprintln!("» {text}");
        match self.reading_time(text) {
            Some(length) if !length.is_zero() => Utterance::Timed(length),
            _ => Utterance::Finished,
        }
    }

    fn cancel_speech(&mut self) {}

    fn play_tone(&mut self, _tone: &Tone) {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}
