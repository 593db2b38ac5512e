//! Configuration types for the work-time accounting engine.
//!
//! These types represent the structure of the YAML configuration files.

use std::collections::HashMap;

use chrono::Weekday;
use serde::Deserialize;

use crate::calculation::{DEFAULT_AVERAGE_WEEKS, DEFAULT_MIN_SAMPLE_DAYS};
use crate::models::{DayPlanConfig, MonthlyEvaluationRules};

/// Engine settings from engine.yaml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSettings {
    /// Trailing average settings for holiday credit category 2.
    #[serde(default)]
    pub holiday_average: HolidayAverageSettings,
    /// Recalculation queue settings.
    #[serde(default)]
    pub queue: QueueSettings,
}

/// How the trailing holiday average is computed.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HolidayAverageSettings {
    /// Length of the trailing window in weeks.
    pub weeks: u32,
    /// Minimum number of sample days for a valid average.
    pub min_sample_days: usize,
}

impl Default for HolidayAverageSettings {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_AVERAGE_WEEKS,
            min_sample_days: DEFAULT_MIN_SAMPLE_DAYS,
        }
    }
}

/// Sizing and retry behaviour of the recalculation queue.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Number of worker shards.
    pub shards: usize,
    /// Bounded capacity of each shard's channel.
    pub capacity: usize,
    /// Attempts per job, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub base_backoff_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            shards: 4,
            capacity: 1024,
            max_attempts: 3,
            base_backoff_ms: 100,
        }
    }
}

/// Day plan codes per weekday. A missing entry means no plan is assigned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekPlan {
    /// Plan code for Mondays.
    #[serde(default)]
    pub monday: Option<String>,
    /// Plan code for Tuesdays.
    #[serde(default)]
    pub tuesday: Option<String>,
    /// Plan code for Wednesdays.
    #[serde(default)]
    pub wednesday: Option<String>,
    /// Plan code for Thursdays.
    #[serde(default)]
    pub thursday: Option<String>,
    /// Plan code for Fridays.
    #[serde(default)]
    pub friday: Option<String>,
    /// Plan code for Saturdays.
    #[serde(default)]
    pub saturday: Option<String>,
    /// Plan code for Sundays.
    #[serde(default)]
    pub sunday: Option<String>,
}

impl WeekPlan {
    /// Returns the plan code assigned to `weekday`.
    pub fn code_for(&self, weekday: Weekday) -> Option<&str> {
        let code = match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        };
        code.as_deref()
    }

    /// Iterates over every assigned plan code.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
        .into_iter()
        .filter_map(|code| code.as_deref())
    }
}

/// Day plan configuration file structure (day_plans.yaml).
#[derive(Debug, Clone, Deserialize)]
pub struct DayPlansConfig {
    /// Every available plan.
    pub plans: Vec<DayPlanConfig>,
    /// The default week plan.
    pub week: WeekPlan,
    /// Week plans of employees that deviate from the default.
    #[serde(default)]
    pub employees: HashMap<String, WeekPlan>,
}

/// Evaluation rules file structure (evaluation_rules.yaml).
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRulesConfig {
    /// Rules for every employee without their own.
    pub default: MonthlyEvaluationRules,
    /// Per-employee rules.
    #[serde(default)]
    pub employees: HashMap<String, MonthlyEvaluationRules>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_settings_defaults_when_empty() {
        let settings: EngineSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings.holiday_average.weeks, 13);
        assert_eq!(settings.holiday_average.min_sample_days, 5);
        assert_eq!(settings.queue.shards, 4);
        assert_eq!(settings.queue.max_attempts, 3);
    }

    #[test]
    fn test_partial_queue_settings_keep_other_defaults() {
        let settings: EngineSettings = serde_yaml::from_str("queue:\n  shards: 8\n").unwrap();
        assert_eq!(settings.queue.shards, 8);
        assert_eq!(settings.queue.capacity, 1024);
    }

    #[test]
    fn test_week_plan_lookup() {
        let week: WeekPlan =
            serde_yaml::from_str("monday: std\nfriday: short\nsunday: rest\n").unwrap();
        assert_eq!(week.code_for(Weekday::Mon), Some("std"));
        assert_eq!(week.code_for(Weekday::Tue), None);
        assert_eq!(week.codes().count(), 3);
    }
}
