//! # FlexWorkout Core Library
//!
//! This library provides the core logic for the FlexWorkout interval timer.
//! Every operation is available through the standalone `flexworkout` CLI,
//! which is a thin real-time driver over the same library.
//!
//! ## Architecture
//!
//! - **Plan**: sections of timed steps, flattened into a playable sequence
//! - **Timer**: a virtual-clock scheduler and the playback state machine,
//!   which the caller drives by advancing time
//! - **Narration**: the shared speech and cue service both engines speak through
//! - **Reminder**: periodic stretch breaks drawn from a shuffled pool
//! - **Storage**: SQLite plan storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`Session`]: one clock, one announcer and both engines
//! - [`PlaybackEngine`]: workout playback state machine
//! - [`ReminderEngine`]: break reminder state machine
//! - [`Database`]: saved plans and the active plan record
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod narration;
pub mod plan;
pub mod reminder;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use narration::{Announcer, AudioOutput, Owner, SilentOutput, SpeechToken, Tone, Utterance};
pub use plan::{build_sequence, default_plan, Plan, PlanStep, RoundsConfig, Section, Step};
pub use reminder::{ReminderEngine, ReminderState, StretchPool};
pub use session::{Mode, Session};
pub use storage::{ActivePlanRecord, Config, Database, PlanStore, SavedPlan};
pub use timer::{PlaybackEngine, PlaybackSnapshot, PlaybackState, PlaybackStatus, Progress};
