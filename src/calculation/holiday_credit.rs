//! Holiday credit calculation.
//!
//! On a holiday the day plan decides what is credited: the target time
//! (category 1), the employee's trailing average net time (category 2), or a
//! fixed value (category 3). The trailing average is the only calculation in
//! the daily pipeline that reads historical values.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, CalculationNotes, DailyValue, HolidayCredit, WarningCode};

/// Default length of the trailing window in weeks.
pub const DEFAULT_AVERAGE_WEEKS: u32 = 13;

/// Default minimum number of sample days for a valid average.
pub const DEFAULT_MIN_SAMPLE_DAYS: usize = 5;

/// The trailing average of net time over a set of historical days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayAverage {
    /// The exact mean.
    pub average: Decimal,
    /// The mean rounded half away from zero to whole minutes.
    pub average_minutes: i32,
    /// Number of days that entered the mean.
    pub sample_days: usize,
    /// True if at least the required number of days was found.
    pub is_valid: bool,
    /// `INSUFFICIENT_DATA_FOR_AVERAGE` if not valid.
    pub notes: CalculationNotes,
    /// The audit step recording the average.
    pub audit_step: AuditStep,
}

/// Computes the mean net time over `history`.
///
/// Holidays, absence days and days without bookings are excluded, both as
/// flagged on the stored values and as listed in `holidays` and
/// `absence_dates`. The mean is valid only with at least `min_days` samples.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use worktime_engine::calculation::calculate_holiday_average;
/// use worktime_engine::models::DailyValue;
/// use chrono::{Duration, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
/// let history: Vec<DailyValue> = (0..10)
///     .map(|i| {
///         let mut value = DailyValue::empty("emp_001", start + Duration::days(i));
///         value.net_time = 480;
///         value.booking_count = 2;
///         value
///     })
///     .collect();
///
/// let result = calculate_holiday_average(&history, &BTreeSet::new(), &BTreeSet::new(), 5, 1);
/// assert!(result.is_valid);
/// assert_eq!(result.average_minutes, 480);
/// ```
pub fn calculate_holiday_average(
    history: &[DailyValue],
    holidays: &BTreeSet<NaiveDate>,
    absence_dates: &BTreeSet<NaiveDate>,
    min_days: usize,
    step_number: u32,
) -> HolidayAverage {
    let samples: Vec<i32> = history
        .iter()
        .filter(|v| !v.is_holiday && v.absence.is_none() && v.booking_count > 0)
        .filter(|v| !holidays.contains(&v.date) && !absence_dates.contains(&v.date))
        .map(|v| v.net_time)
        .collect();

    let sample_days = samples.len();
    let average = if sample_days == 0 {
        Decimal::ZERO
    } else {
        let sum: Decimal = samples.iter().map(|&m| Decimal::from(m)).sum();
        sum / Decimal::from(sample_days)
    };
    let average_minutes = average
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
        .unwrap_or(0);

    let is_valid = sample_days >= min_days && sample_days > 0;
    let notes = if is_valid {
        CalculationNotes::default()
    } else {
        CalculationNotes::default().with_warning(WarningCode::InsufficientDataForAverage)
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "holiday_average".to_string(),
        rule_name: "Trailing Net Time Average".to_string(),
        input: serde_json::json!({
            "history_days": history.len(),
            "min_days": min_days
        }),
        output: serde_json::json!({
            "sample_days": sample_days,
            "average": average.to_string(),
            "average_minutes": average_minutes,
            "is_valid": is_valid
        }),
        reasoning: if is_valid {
            format!(
                "Mean net time over {} day(s) is {} minute(s)",
                sample_days, average_minutes
            )
        } else {
            format!(
                "Only {} sample day(s), {} required",
                sample_days, min_days
            )
        },
    };

    HolidayAverage {
        average,
        average_minutes,
        sample_days,
        is_valid,
        notes,
        audit_step,
    }
}

/// The minutes credited for a holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCreditResult {
    /// Minutes credited to gross and target time.
    pub minutes: i32,
    /// The category that was applied (1, 2 or 3).
    pub category: u8,
    /// Warnings from the trailing average, if it was used.
    pub notes: CalculationNotes,
    /// The audit step recording the credit.
    pub audit_step: AuditStep,
}

/// Chooses the holiday credit for a day.
///
/// Category 2 needs the result of [`calculate_holiday_average`]; without a
/// valid average it falls back to the target and records
/// `INSUFFICIENT_DATA_FOR_AVERAGE`.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::holiday_credit_minutes;
/// use worktime_engine::models::{HolidayCredit, WarningCode};
///
/// let fixed = holiday_credit_minutes(HolidayCredit::Fixed { minutes: 420 }, 480, None, 1);
/// assert_eq!(fixed.minutes, 420);
///
/// let fallback = holiday_credit_minutes(HolidayCredit::TrailingAverage, 480, None, 1);
/// assert_eq!(fallback.minutes, 480);
/// assert!(fallback.notes.warnings.contains(&WarningCode::InsufficientDataForAverage));
/// ```
pub fn holiday_credit_minutes(
    credit: HolidayCredit,
    target_minutes: i32,
    average: Option<&HolidayAverage>,
    step_number: u32,
) -> HolidayCreditResult {
    let (minutes, notes, reasoning) = match credit {
        HolidayCredit::Target => (
            target_minutes,
            CalculationNotes::default(),
            format!("Target time {} credited", target_minutes),
        ),
        HolidayCredit::Fixed { minutes } => (
            minutes,
            CalculationNotes::default(),
            format!("Fixed value {} credited", minutes),
        ),
        HolidayCredit::TrailingAverage => match average {
            Some(avg) if avg.is_valid => (
                avg.average_minutes,
                avg.notes.clone(),
                format!(
                    "Trailing average {} credited ({} sample days)",
                    avg.average_minutes, avg.sample_days
                ),
            ),
            Some(avg) => (
                target_minutes,
                avg.notes.clone(),
                format!(
                    "Only {} sample day(s); target time {} credited instead",
                    avg.sample_days, target_minutes
                ),
            ),
            None => (
                target_minutes,
                CalculationNotes::default().with_warning(WarningCode::InsufficientDataForAverage),
                format!("No history; target time {} credited instead", target_minutes),
            ),
        },
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "holiday_credit".to_string(),
        rule_name: "Holiday Credit".to_string(),
        input: serde_json::json!({
            "category": credit.category(),
            "target_minutes": target_minutes
        }),
        output: serde_json::json!({
            "credited_minutes": minutes
        }),
        reasoning,
    };

    HolidayCreditResult {
        minutes,
        category: credit.category(),
        notes,
        audit_step,
    }
}
