mod engine;
mod pool;

pub use engine::{interval_secs, ReminderEngine, ReminderState, ReminderTiming, BREAK_STEPS};
pub use pool::StretchPool;
