//! Day-level error detection.
//!
//! Pairing and day-change resolution report their own anomalies; this stage
//! adds the checks that need the finished day (allowed window, maximum time)
//! and merges every stage's notes into one set.

use crate::models::{AuditStep, CalculationNotes, DayPlanConfig, ErrorCode, MINUTES_PER_DAY};

/// The merged notes of a day.
#[derive(Debug, Clone)]
pub struct ErrorDetection {
    /// Every error and warning of the day.
    pub notes: CalculationNotes,
    /// The audit step recording the checks.
    pub audit_step: AuditStep,
}

/// Checks the finished day and merges `stage_notes` into the result.
///
/// - `CAME_BEFORE_ALLOWED` if the first real arrival is before the plan's
///   earliest allowed arrival.
/// - `LEFT_AFTER_ALLOWED` if the last real departure is after the plan's
///   latest allowed departure.
/// - `EXCEEDED_MAX_TIME` if more than a full day of work was credited.
///
/// Times are the adjusted (post tolerance and rounding) boundaries.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::detect_errors;
/// use worktime_engine::models::{CalculationNotes, DayPlanConfig, ErrorCode};
///
/// let mut plan = DayPlanConfig::with_target("std", 480);
/// plan.earliest_arrival = Some(360);
///
/// let result = detect_errors(Some(330), Some(1020), 690, &plan, Vec::new(), 6);
/// assert!(result.notes.errors.contains(&ErrorCode::CameBeforeAllowed));
/// ```
pub fn detect_errors(
    first_arrival: Option<i32>,
    last_departure: Option<i32>,
    credited_gross: i32,
    plan: &DayPlanConfig,
    stage_notes: impl IntoIterator<Item = CalculationNotes>,
    step_number: u32,
) -> ErrorDetection {
    let mut found = CalculationNotes::default();

    if let (Some(arrival), Some(earliest)) = (first_arrival, plan.earliest_arrival) {
        if arrival < earliest {
            found = found.with_error(ErrorCode::CameBeforeAllowed);
        }
    }
    if let (Some(departure), Some(latest)) = (last_departure, plan.latest_departure) {
        if departure > latest {
            found = found.with_error(ErrorCode::LeftAfterAllowed);
        }
    }
    if credited_gross > MINUTES_PER_DAY {
        found = found.with_error(ErrorCode::ExceededMaxTime);
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "error_detection".to_string(),
        rule_name: "Error Detection".to_string(),
        input: serde_json::json!({
            "first_arrival": first_arrival,
            "last_departure": last_departure,
            "earliest_arrival": plan.earliest_arrival,
            "latest_departure": plan.latest_departure,
            "credited_gross": credited_gross
        }),
        output: serde_json::json!({
            "errors": found.errors
        }),
        reasoning: if found.errors.is_empty() {
            "Day is within the allowed window and time limits".to_string()
        } else {
            format!("{} check(s) failed", found.errors.len())
        },
    };

    let notes = stage_notes.into_iter().fold(found, CalculationNotes::merge);

    ErrorDetection { notes, audit_step }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WarningCode;

    fn windowed_plan() -> DayPlanConfig {
        let mut plan = DayPlanConfig::with_target("std", 480);
        plan.earliest_arrival = Some(360);
        plan.latest_departure = Some(1200);
        plan
    }

    #[test]
    fn test_day_inside_window_is_clean() {
        let result = detect_errors(Some(480), Some(1020), 540, &windowed_plan(), Vec::new(), 1);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_left_after_allowed() {
        let result = detect_errors(Some(480), Some(1230), 750, &windowed_plan(), Vec::new(), 1);
        assert!(result.notes.errors.contains(&ErrorCode::LeftAfterAllowed));
        assert!(!result.notes.errors.contains(&ErrorCode::CameBeforeAllowed));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let result = detect_errors(Some(360), Some(1200), 840, &windowed_plan(), Vec::new(), 1);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_no_window_configured_never_flags() {
        let plan = DayPlanConfig::with_target("flex", 480);
        let result = detect_errors(Some(0), Some(1439), 1439, &plan, Vec::new(), 1);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_exceeded_max_time() {
        let plan = DayPlanConfig::with_target("flex", 480);
        let result = detect_errors(None, None, MINUTES_PER_DAY + 1, &plan, Vec::new(), 1);
        assert!(result.notes.errors.contains(&ErrorCode::ExceededMaxTime));

        let result = detect_errors(None, None, MINUTES_PER_DAY, &plan, Vec::new(), 1);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_stage_notes_are_merged() {
        let stages = vec![
            CalculationNotes::default().with_error(ErrorCode::MissingGo),
            CalculationNotes::default().with_warning(WarningCode::DayChangeAutoComplete),
        ];
        let result = detect_errors(Some(300), None, 0, &windowed_plan(), stages, 1);
        assert_eq!(result.notes.errors.len(), 2);
        assert!(result.notes.errors.contains(&ErrorCode::MissingGo));
        assert!(result.notes.errors.contains(&ErrorCode::CameBeforeAllowed));
        assert_eq!(result.notes.warnings.len(), 1);
        // The audit step lists only the checks run here.
        assert_eq!(result.audit_step.output["errors"][0], "CAME_BEFORE_ALLOWED");
    }
}
