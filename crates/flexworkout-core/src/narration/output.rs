use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Amplitude shape of a tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack_ms: u64,
    /// Peak gain, 0.0 ..= 1.0.
    pub peak: f32,
    pub release_ms: u64,
}

/// A short cue tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub envelope: Envelope,
    pub duration_ms: u64,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            envelope: Envelope {
                attack_ms: 10,
                peak: 0.5,
                release_ms: 140,
            },
            duration_ms: 150,
        }
    }
}

/// How a backend accepted an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utterance {
    /// Nothing to wait for (no speech engine, or nothing was said).
    Finished,
    /// Completion will be reported later through the session.
    Pending,
    /// Speech runs for a known duration.
    Timed(Duration),
}

/// Platform audio: speech synthesis plus tone generation.
pub trait AudioOutput {
    fn speak(&mut self, text: &str) -> Utterance;

    fn cancel_speech(&mut self);

    fn play_tone(&mut self, tone: &Tone);
}

/// Used when the platform has no audio capability. Every utterance
/// completes immediately and tones are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn speak(&mut self, _text: &str) -> Utterance {
        Utterance::Finished
    }

    fn cancel_speech(&mut self) {}

    fn play_tone(&mut self, _tone: &Tone) {}
}
