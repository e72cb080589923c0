mod catalog;
mod model;
mod sequence;

pub use catalog::{default_plan, flattened_stretches, stretch_catalogue, Stretch, StretchCategory};
pub use model::{Plan, Section, Step};
pub use sequence::{build_sequence, total_secs, PlanStep, RoundsConfig};
