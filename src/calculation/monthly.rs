//! Monthly aggregation and flextime crediting.
//!
//! A month's daily values are summed, the flextime change is credited into
//! the balance under exactly one [`CreditType`], and in December the annual
//! floor is applied to the balance carried into the new year.

use serde::{Deserialize, Serialize};

use crate::models::{
    Absence, AbsenceSummary, CalculationNotes, CreditType, DailyValue, MonthlyEvaluationRules,
    MonthlyValue, WarningCode,
};

/// The outcome of crediting one month's flextime change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlextimeCredit {
    /// The part of the change that entered the balance.
    pub credited: i32,
    /// Balance at month end.
    pub end: i32,
    /// Minutes removed by thresholds, caps and resets.
    pub forfeited: i32,
    /// Warnings raised by the policy.
    pub notes: CalculationNotes,
}

/// Credits `change` into the balance `start` under `rules`.
///
/// - `NoEvaluation`: the change is credited in full, no caps.
/// - `CompleteCarryover`: the monthly cap truncates a positive change
///   (`MONTHLY_CAP_REACHED`), then the balance caps apply.
/// - `AfterThreshold`: a positive change credits only the part above the
///   threshold; at or below it everything is forfeited with
///   `BELOW_THRESHOLD`. A negative change is credited in full. The monthly
///   cap and the balance caps apply afterwards.
/// - `NoCarryover`: nothing is credited and the balance resets to 0; a
///   positive change is forfeited with `NO_CARRYOVER`.
///
/// Balance caps clamp the end balance to `positive_cap` and `-negative_cap`
/// and record `FLEXTIME_CAPPED`. Every removed minute counts as forfeited.
///
/// # Examples
///
/// ```
/// use worktime_engine::calculation::apply_credit_policy;
/// use worktime_engine::models::{CreditType, MonthlyEvaluationRules, WarningCode};
///
/// let rules = MonthlyEvaluationRules {
///     credit_type: CreditType::AfterThreshold,
///     flextime_threshold: Some(60),
///     ..Default::default()
/// };
///
/// let above = apply_credit_policy(0, 120, &rules);
/// assert_eq!((above.credited, above.forfeited), (60, 60));
/// assert!(above.notes.is_empty());
///
/// let below = apply_credit_policy(0, 30, &rules);
/// assert_eq!((below.credited, below.forfeited), (0, 30));
/// assert!(below.notes.warnings.contains(&WarningCode::BelowThreshold));
/// ```
pub fn apply_credit_policy(start: i32, change: i32, rules: &MonthlyEvaluationRules) -> FlextimeCredit {
    let mut notes = CalculationNotes::default();
    let mut forfeited = 0;

    let credited_change = match rules.credit_type {
        CreditType::NoEvaluation => {
            return FlextimeCredit {
                credited: change,
                end: start + change,
                forfeited: 0,
                notes,
            };
        }
        CreditType::NoCarryover => {
            if change > 0 {
                notes = notes.with_warning(WarningCode::NoCarryover);
            }
            return FlextimeCredit {
                credited: 0,
                end: 0,
                forfeited: change.max(0),
                notes,
            };
        }
        CreditType::CompleteCarryover => change,
        CreditType::AfterThreshold => {
            let threshold = rules.flextime_threshold.unwrap_or(0);
            if change > threshold {
                forfeited += threshold;
                change - threshold
            } else if change > 0 {
                notes = notes.with_warning(WarningCode::BelowThreshold);
                forfeited += change;
                0
            } else {
                change
            }
        }
    };

    let credited_change = match rules.monthly_cap {
        Some(cap) if credited_change > cap => {
            notes = notes.with_warning(WarningCode::MonthlyCapReached);
            forfeited += credited_change - cap;
            cap
        }
        _ => credited_change,
    };

    let raw_end = start + credited_change;
    let mut end = raw_end;
    if let Some(cap) = rules.positive_cap {
        end = end.min(cap);
    }
    if let Some(cap) = rules.negative_cap {
        end = end.max(-cap);
    }
    if end != raw_end {
        notes = notes.with_warning(WarningCode::FlextimeCapped);
        forfeited += (raw_end - end).abs();
    }

    FlextimeCredit {
        credited: end - start,
        end,
        forfeited,
        notes,
    }
}

/// Raises a December balance to the annual floor.
///
/// Returns the balance carried into the next month and the warnings raised.
/// In any other month, or without a floor, the balance is returned unchanged.
///
/// ```
/// use worktime_engine::calculation::apply_annual_floor;
/// use worktime_engine::models::{MonthlyEvaluationRules, WarningCode};
///
/// let rules = MonthlyEvaluationRules { annual_floor: Some(-600), ..Default::default() };
/// let (carryover, notes) = apply_annual_floor(-900, 12, &rules);
/// assert_eq!(carryover, -600);
/// assert!(notes.warnings.contains(&WarningCode::AnnualFloorApplied));
///
/// let (carryover, _) = apply_annual_floor(-900, 11, &rules);
/// assert_eq!(carryover, -900);
/// ```
pub fn apply_annual_floor(
    balance: i32,
    month: u32,
    rules: &MonthlyEvaluationRules,
) -> (i32, CalculationNotes) {
    match rules.annual_floor {
        Some(floor) if month == 12 && balance < floor => (
            floor,
            CalculationNotes::default().with_warning(WarningCode::AnnualFloorApplied),
        ),
        _ => (balance, CalculationNotes::default()),
    }
}

/// Rolls a month of daily values into a [`MonthlyValue`].
///
/// `carryover` is the previous month's `flextime_carryover` (0 if there is
/// none). `absences` are the month's absence records; days are counted by
/// portion. Closed state is left empty for the caller to carry over.
pub fn aggregate_month(
    employee_id: &str,
    year: i32,
    month: u32,
    daily_values: &[DailyValue],
    absences: &[Absence],
    carryover: i32,
    rules: &MonthlyEvaluationRules,
) -> MonthlyValue {
    let sum = |f: fn(&DailyValue) -> i32| daily_values.iter().map(f).sum::<i32>();

    let total_overtime = sum(|v| v.overtime);
    let total_undertime = sum(|v| v.undertime);
    let flextime_change = total_overtime - total_undertime;

    let credit = apply_credit_policy(carryover, flextime_change, rules);
    let (flextime_carryover, floor_notes) = apply_annual_floor(credit.end, month, rules);
    let notes = credit.notes.merge(floor_notes);

    let mut summary = AbsenceSummary::default();
    for absence in absences {
        summary.add(absence.kind, absence.portion);
    }

    MonthlyValue {
        employee_id: employee_id.to_string(),
        year,
        month,
        total_gross_time: sum(|v| v.gross_time),
        total_net_time: sum(|v| v.net_time),
        total_target_time: sum(|v| v.target_time),
        total_overtime,
        total_undertime,
        total_break_time: sum(|v| v.break_time),
        flextime_start: carryover,
        flextime_change,
        flextime_credited: credit.credited,
        flextime_end: credit.end,
        flextime_carryover,
        forfeited_time: credit.forfeited,
        work_days: daily_values.iter().filter(|v| v.is_work_day()).count() as u32,
        error_days: daily_values.iter().filter(|v| v.has_error).count() as u32,
        absences: summary,
        warnings: notes.warnings,
        is_closed: false,
        closed_at: None,
        closed_by: None,
        reopened_at: None,
        reopened_by: None,
    }
}
