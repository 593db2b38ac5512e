//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! settings, day plans and evaluation rules from YAML files.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{DayPlanConfig, MonthlyEvaluationRules};
use crate::store::{DayPlanResolver, EvaluationRulesStore};

use super::types::{DayPlansConfig, EngineSettings, EvaluationRulesConfig, WeekPlan};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml            # Holiday average and queue settings
/// ├── day_plans.yaml         # Day plans and week plans
/// └── evaluation_rules.yaml  # Monthly evaluation rules
/// ```
///
/// Every day plan and rule set is validated while loading, so a loader that
/// was created successfully only hands out usable configuration.
///
/// # Example
///
/// ```no_run
/// use worktime_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let plan = loader.plan_for("emp_001", date).unwrap();
/// println!("Plan: {} ({} minutes)", plan.code, plan.target_minutes);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
    plans: HashMap<String, DayPlanConfig>,
    week: WeekPlan,
    employee_weeks: HashMap<String, WeekPlan>,
    rules: EvaluationRulesConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A day plan or rule set fails validation
    /// - A week plan refers to an unknown day plan
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;

        let plans_path = path.join("day_plans.yaml");
        let day_plans = Self::load_yaml::<DayPlansConfig>(&plans_path)?;

        let rules_path = path.join("evaluation_rules.yaml");
        let rules = Self::load_yaml::<EvaluationRulesConfig>(&rules_path)?;

        let mut plans = HashMap::new();
        for plan in day_plans.plans {
            plan.validate()?;
            if plans.contains_key(&plan.code) {
                return Err(EngineError::ConfigParseError {
                    path: plans_path.display().to_string(),
                    message: format!("duplicate day plan '{}'", plan.code),
                });
            }
            plans.insert(plan.code.clone(), plan);
        }

        let weeks = std::iter::once(&day_plans.week).chain(day_plans.employees.values());
        for week in weeks {
            for code in week.codes() {
                if !plans.contains_key(code) {
                    return Err(EngineError::ConfigParseError {
                        path: plans_path.display().to_string(),
                        message: format!("week plan refers to unknown day plan '{}'", code),
                    });
                }
            }
        }

        rules.default.validate()?;
        for employee_rules in rules.employees.values() {
            employee_rules.validate()?;
        }

        Ok(Self {
            settings,
            plans,
            week: day_plans.week,
            employee_weeks: day_plans.employees,
            rules,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Gets a day plan by its code.
    pub fn get_day_plan(&self, code: &str) -> Option<&DayPlanConfig> {
        self.plans.get(code)
    }

    /// Returns the plan assigned to the employee on `date` by their week plan.
    ///
    /// Employees without their own week plan use the default one. Returns
    /// `None` if the weekday has no plan.
    pub fn plan_for(&self, employee_id: &str, date: NaiveDate) -> Option<&DayPlanConfig> {
        let week = self.employee_weeks.get(employee_id).unwrap_or(&self.week);
        week.code_for(date.weekday())
            .and_then(|code| self.plans.get(code))
    }

    /// Returns the evaluation rules of the employee.
    pub fn rules_for(&self, employee_id: &str) -> &MonthlyEvaluationRules {
        self.rules
            .employees
            .get(employee_id)
            .unwrap_or(&self.rules.default)
    }
}

impl DayPlanResolver for ConfigLoader {
    fn day_plan(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<DayPlanConfig>> {
        Ok(self.plan_for(employee_id, date).cloned())
    }
}

impl EvaluationRulesStore for ConfigLoader {
    fn evaluation_rules(&self, employee_id: &str) -> EngineResult<Option<MonthlyEvaluationRules>> {
        Ok(Some(*self.rules_for(employee_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreditType, DayChangePolicy};
    use std::path::PathBuf;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn temp_config(day_plans: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("worktime-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("engine.yaml"), "{}").unwrap();
        fs::write(dir.join("day_plans.yaml"), day_plans).unwrap();
        fs::write(
            dir.join("evaluation_rules.yaml"),
            "default:\n  credit_type: no_evaluation\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.settings().holiday_average.weeks, 13);
        assert!(loader.get_day_plan("office").is_some());
    }

    #[test]
    fn test_default_week_plan() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        // 2026-03-02 is a Monday, 2026-03-06 a Friday, 2026-03-07 a Saturday
        let monday = loader.plan_for("emp_001", make_date("2026-03-02")).unwrap();
        assert_eq!(monday.code, "office");
        assert_eq!(monday.target_minutes, 480);

        let friday = loader.plan_for("emp_001", make_date("2026-03-06")).unwrap();
        assert_eq!(friday.code, "short");

        let saturday = loader.plan_for("emp_001", make_date("2026-03-07")).unwrap();
        assert_eq!(saturday.target_minutes, 0);
    }

    #[test]
    fn test_employee_week_plan_overrides_default() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let plan = loader.plan_for("emp_night", make_date("2026-03-02")).unwrap();
        assert_eq!(plan.code, "night");
        assert_eq!(plan.day_change, DayChangePolicy::AutoComplete);
    }

    #[test]
    fn test_rules_for_employee() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert_eq!(
            loader.rules_for("emp_001").credit_type,
            CreditType::CompleteCarryover
        );
        assert_eq!(
            loader.rules_for("emp_night").credit_type,
            CreditType::AfterThreshold
        );
        assert!(loader.evaluation_rules("anyone").unwrap().is_some());
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_plan_in_week_is_rejected() {
        let dir = temp_config(
            "plans:\n  - code: std\n    target_minutes: 480\nweek:\n  monday: missing\n",
        );
        let result = ConfigLoader::load(&dir);
        assert!(matches!(result, Err(EngineError::ConfigParseError { ref message, .. }) if message.contains("missing")));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_invalid_plan_is_rejected_on_load() {
        let dir = temp_config(
            "plans:\n  - code: bad\n    target_minutes: 2000\nweek:\n  monday: bad\n",
        );
        let result = ConfigLoader::load(&dir);
        assert!(matches!(result, Err(EngineError::InvalidDayPlan { ref code, .. }) if code == "bad"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_malformed_yaml_returns_parse_error() {
        let dir = temp_config("plans: [unclosed");
        let result = ConfigLoader::load(&dir);
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
        fs::remove_dir_all(dir).ok();
    }
}
