//! Configuration loading and management for the work-time accounting engine.
//!
//! This module loads engine settings, day plans with their week plans, and
//! monthly evaluation rules from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use worktime_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Queue shards: {}", config.settings().queue.shards);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DayPlansConfig, EngineSettings, EvaluationRulesConfig, HolidayAverageSettings, QueueSettings,
    WeekPlan,
};
