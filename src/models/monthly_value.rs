//! Monthly aggregation output and the tenant's evaluation policy.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::absence::AbsenceKind;
use super::notes::WarningCode;

/// How a month's flextime change is transferred into the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    /// Direct transfer, no caps.
    #[default]
    NoEvaluation,
    /// Full transfer subject to monthly and balance caps.
    CompleteCarryover,
    /// Positive change only counts above a threshold.
    AfterThreshold,
    /// Flextime is reset every month.
    NoCarryover,
}

/// Tenant-level monthly evaluation policy.
///
/// Caps are positive minute values; `negative_cap: Some(600)` means the
/// balance may not drop below -600. `annual_floor` is a signed balance
/// (e.g. `-6000` for -100h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthlyEvaluationRules {
    /// The crediting policy.
    #[serde(default)]
    pub credit_type: CreditType,
    /// Threshold for [`CreditType::AfterThreshold`].
    #[serde(default)]
    pub flextime_threshold: Option<i32>,
    /// Maximum positive change credited per month.
    #[serde(default)]
    pub monthly_cap: Option<i32>,
    /// Maximum positive balance.
    #[serde(default)]
    pub positive_cap: Option<i32>,
    /// Maximum negative balance, as a positive number.
    #[serde(default)]
    pub negative_cap: Option<i32>,
    /// Minimum balance carried over a year boundary.
    #[serde(default)]
    pub annual_floor: Option<i32>,
}

impl MonthlyEvaluationRules {
    /// Checks that caps and thresholds are usable.
    pub fn validate(&self) -> EngineResult<()> {
        let non_negative = [
            ("flextime_threshold", self.flextime_threshold),
            ("monthly_cap", self.monthly_cap),
            ("positive_cap", self.positive_cap),
            ("negative_cap", self.negative_cap),
        ];
        for (name, value) in non_negative {
            if let Some(v) = value {
                if v < 0 {
                    return Err(EngineError::InvalidEvaluationRules {
                        message: format!("{} must not be negative, got {}", name, v),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Absence days of a month, summed per kind (half days count 0.5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceSummary {
    /// Vacation days.
    pub vacation_days: Decimal,
    /// Sick days.
    pub sickness_days: Decimal,
    /// Other paid leave days.
    pub special_days: Decimal,
    /// Unpaid leave days.
    pub unpaid_days: Decimal,
}

impl AbsenceSummary {
    /// Adds `portion` of a day to the counter for `kind`.
    pub fn add(&mut self, kind: AbsenceKind, portion: Decimal) {
        let counter = match kind {
            AbsenceKind::Vacation => &mut self.vacation_days,
            AbsenceKind::Sickness => &mut self.sickness_days,
            AbsenceKind::Special => &mut self.special_days,
            AbsenceKind::Unpaid => &mut self.unpaid_days,
        };
        *counter += portion;
    }

    /// Total absent days of every kind.
    pub fn total(&self) -> Decimal {
        self.vacation_days + self.sickness_days + self.special_days + self.unpaid_days
    }
}

/// Aggregated figures for one employee-month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyValue {
    /// The employee.
    pub employee_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Sum of daily gross time.
    pub total_gross_time: i32,
    /// Sum of daily net time.
    pub total_net_time: i32,
    /// Sum of daily target time.
    pub total_target_time: i32,
    /// Sum of daily overtime.
    pub total_overtime: i32,
    /// Sum of daily undertime.
    pub total_undertime: i32,
    /// Sum of daily break time.
    pub total_break_time: i32,
    /// Balance carried in from the previous month.
    pub flextime_start: i32,
    /// `total_overtime - total_undertime`.
    pub flextime_change: i32,
    /// The part of the change that entered the balance.
    pub flextime_credited: i32,
    /// Balance at month end after the credit policy.
    pub flextime_end: i32,
    /// Balance carried into the next month (after the annual floor in December).
    pub flextime_carryover: i32,
    /// Minutes removed by thresholds, caps and resets.
    pub forfeited_time: i32,
    /// Days with at least one booking.
    pub work_days: u32,
    /// Days flagged with at least one error.
    pub error_days: u32,
    /// Absence days by kind.
    pub absences: AbsenceSummary,
    /// Warnings raised by the credit policy.
    pub warnings: BTreeSet<WarningCode>,
    /// True once the month is sealed.
    pub is_closed: bool,
    /// When the month was last closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Who last closed the month.
    pub closed_by: Option<String>,
    /// When the month was last reopened.
    pub reopened_at: Option<DateTime<Utc>>,
    /// Who last reopened the month.
    pub reopened_by: Option<String>,
}

impl MonthlyValue {
    /// Copies the closed/reopened state from a previously stored value.
    pub fn carry_state_from(&mut self, previous: &MonthlyValue) {
        self.is_closed = previous.is_closed;
        self.closed_at = previous.closed_at;
        self.closed_by = previous.closed_by.clone();
        self.reopened_at = previous.reopened_at;
        self.reopened_by = previous.reopened_by.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_deserialize_from_yaml() {
        let yaml = r#"
credit_type: after_threshold
flextime_threshold: 60
positive_cap: 2400
annual_floor: -6000
"#;
        let rules: MonthlyEvaluationRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.credit_type, CreditType::AfterThreshold);
        assert_eq!(rules.flextime_threshold, Some(60));
        assert_eq!(rules.monthly_cap, None);
        assert_eq!(rules.annual_floor, Some(-6000));
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_negative_cap_value_is_rejected() {
        let rules = MonthlyEvaluationRules {
            negative_cap: Some(-10),
            ..Default::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(EngineError::InvalidEvaluationRules { .. })
        ));
    }

    #[test]
    fn test_absence_summary_adds_portions() {
        let mut summary = AbsenceSummary::default();
        summary.add(AbsenceKind::Vacation, Decimal::ONE);
        summary.add(AbsenceKind::Vacation, Decimal::new(5, 1));
        summary.add(AbsenceKind::Sickness, Decimal::ONE);

        assert_eq!(summary.vacation_days, Decimal::new(15, 1));
        assert_eq!(summary.total(), Decimal::new(25, 1));
    }
}
