//! Narration and cue port.
//!
//! [`AudioOutput`] is the platform capability (speech synthesis and tone
//! generation). [`Announcer`] wraps it as the single shared service both
//! engines speak through.

mod announcer;
mod output;
mod recording;

pub use announcer::{Announcer, Owner, Speech, SpeechToken};
pub use output::{AudioOutput, Envelope, SilentOutput, Tone, Utterance};
pub use recording::{AudioLog, RecordingOutput};
