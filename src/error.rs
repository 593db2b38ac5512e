//! Error types for the work-time accounting engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition that makes a calculation fail outright. Anomalies in
//! the bookings themselves (missing arrival, overlapping pairs, ...) are not
//! errors in this sense: they are recorded on the resulting
//! [`DailyValue`](crate::models::DailyValue) instead.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the work-time accounting engine.
///
/// # Example
///
/// ```
/// use worktime_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No day plan is assigned to the employee for the given date.
    #[error("No day plan found for employee '{employee_id}' on {date}")]
    DayPlanNotFound {
        /// The employee whose plan was requested.
        employee_id: String,
        /// The date for which the plan was requested.
        date: NaiveDate,
    },

    /// A day plan contains values the engine cannot work with.
    #[error("Invalid day plan '{code}': {message}")]
    InvalidDayPlan {
        /// The code of the offending day plan.
        code: String,
        /// A description of what made the plan invalid.
        message: String,
    },

    /// No monthly evaluation rules are configured for the employee.
    #[error("No monthly evaluation rules found for employee '{employee_id}'")]
    EvaluationRulesNotFound {
        /// The employee whose rules were requested.
        employee_id: String,
    },

    /// Monthly evaluation rules contain inconsistent values.
    #[error("Invalid monthly evaluation rules: {message}")]
    InvalidEvaluationRules {
        /// A description of what made the rules invalid.
        message: String,
    },

    /// A stored booking carries a value outside the accepted range.
    #[error("Invalid booking {booking_id}: {message}")]
    InvalidBooking {
        /// The offending booking.
        booking_id: Uuid,
        /// A description of the invalid value.
        message: String,
    },

    /// The requested year/month or date range does not exist.
    #[error("Invalid period: {message}")]
    InvalidPeriod {
        /// A description of the invalid period.
        message: String,
    },

    /// The month is closed and its values must not be recomputed.
    #[error("Month {year}-{month:02} is closed for employee '{employee_id}'")]
    MonthClosed {
        /// The employee owning the closed month.
        employee_id: String,
        /// The year of the closed month.
        year: i32,
        /// The closed month (1-12).
        month: u32,
    },

    /// No monthly value exists for the requested month.
    #[error("No monthly value for employee '{employee_id}' in {year}-{month:02}")]
    MonthlyValueNotFound {
        /// The employee whose month was requested.
        employee_id: String,
        /// The requested year.
        year: i32,
        /// The requested month (1-12).
        month: u32,
    },

    /// A month state transition (close/reopen) is not allowed from the current state.
    #[error("Invalid month state transition: {message}")]
    InvalidStateTransition {
        /// A description of the rejected transition.
        message: String,
    },

    /// An external store could not be reached. Safe to retry.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// A description of the failure.
        message: String,
    },

    /// The recalculation queue has been shut down.
    #[error("Recalculation queue is closed")]
    QueueClosed,
}

impl EngineError {
    /// Returns true if retrying the same operation may succeed.
    ///
    /// # Example
    ///
    /// ```
    /// use worktime_engine::error::EngineError;
    ///
    /// let error = EngineError::StoreUnavailable { message: "timeout".to_string() };
    /// assert!(error.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::StoreUnavailable { .. })
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/engine.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/engine.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_day_plan_not_found_displays_employee_and_date() {
        let error = EngineError::DayPlanNotFound {
            employee_id: "emp_001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "No day plan found for employee 'emp_001' on 2026-03-02"
        );
    }

    #[test]
    fn test_month_closed_pads_month() {
        let error = EngineError::MonthClosed {
            employee_id: "emp_001".to_string(),
            year: 2026,
            month: 3,
        };
        assert_eq!(
            error.to_string(),
            "Month 2026-03 is closed for employee 'emp_001'"
        );
    }

    #[test]
    fn test_invalid_day_plan_displays_code_and_message() {
        let error = EngineError::InvalidDayPlan {
            code: "std".to_string(),
            message: "rounding interval must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid day plan 'std': rounding interval must be positive"
        );
    }

    #[test]
    fn test_only_store_failures_are_transient() {
        assert!(
            EngineError::StoreUnavailable {
                message: "down".to_string()
            }
            .is_transient()
        );
        assert!(
            !EngineError::MonthClosed {
                employee_id: "e".to_string(),
                year: 2026,
                month: 1
            }
            .is_transient()
        );
        assert!(!EngineError::QueueClosed.is_transient());
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_rules_not_found() -> EngineResult<()> {
            Err(EngineError::EvaluationRulesNotFound {
                employee_id: "emp_001".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_rules_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
