pub mod config;
pub mod plan;
pub mod remind;
pub mod run;
