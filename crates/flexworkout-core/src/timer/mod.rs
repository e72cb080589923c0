mod engine;
mod progress;
mod scheduler;

pub use engine::{PlaybackEngine, PlaybackSnapshot, PlaybackState, PlaybackStatus, PlaybackTiming};
pub use progress::Progress;
pub use scheduler::{Scheduler, TimerHandle, TimerQueue, Wake};
