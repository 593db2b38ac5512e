//! Calculation result models.
//!
//! This module contains the [`DailyCalculation`] type returned by a
//! "calculate now" request and the audit trace that records every decision
//! made by the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::BookingPair;
use super::daily_value::{BreakDetail, DailyValue};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
///
/// # Example
///
/// ```
/// use worktime_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "booking_pairing".to_string(),
///     rule_name: "Booking Pairing".to_string(),
///     input: serde_json::json!({"booking_count": 2}),
///     output: serde_json::json!({"work_pairs": 1}),
///     reasoning: "2 bookings formed 1 work pair".to_string(),
/// };
/// assert_eq!(step.rule_id, "booking_pairing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// The result of calculating one employee-day.
///
/// `value` is what gets persisted; everything else explains how it was
/// reached and is regenerated on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCalculation {
    /// Unique identifier for this run.
    pub calculation_id: Uuid,
    /// When the run happened.
    pub timestamp: DateTime<Utc>,
    /// Version of the engine that produced the result.
    pub engine_version: String,
    /// The persisted daily value.
    pub value: DailyValue,
    /// Work and break intervals credited to the day, including synthetic ones.
    pub pairs: Vec<BookingPair>,
    /// Every applied break deduction.
    pub break_details: Vec<BreakDetail>,
    /// Step-by-step record of the run.
    pub audit_trace: AuditTrace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_daily_calculation_round_trips_through_json() {
        let calculation = DailyCalculation {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: "0.1.0".to_string(),
            value: DailyValue::empty("emp_001", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()),
            pairs: vec![],
            break_details: vec![],
            audit_trace: AuditTrace {
                steps: vec![AuditStep {
                    step_number: 1,
                    rule_id: "booking_pairing".to_string(),
                    rule_name: "Booking Pairing".to_string(),
                    input: serde_json::json!({}),
                    output: serde_json::json!({}),
                    reasoning: String::new(),
                }],
                duration_us: 12,
            },
        };

        let json = serde_json::to_string(&calculation).unwrap();
        let parsed: DailyCalculation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, calculation);
    }
}
