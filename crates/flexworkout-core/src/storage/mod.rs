mod config;
pub mod database;

pub use config::{Config, CuesConfig, NarrationConfig, ReminderConfig, TimingConfig};
pub use database::{ActivePlanRecord, Database, PlanStore, SavedPlan};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `FLEXWORKOUT_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/flexworkout`, or `~/.config/flexworkout-dev` when
/// `FLEXWORKOUT_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FLEXWORKOUT_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FLEXWORKOUT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("flexworkout-dev")
            } else {
                base_dir.join("flexworkout")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
