//! The per-day calculation output.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::absence::AbsenceKind;
use super::notes::{CalculationNotes, ErrorCode, WarningCode};

/// Version of the daily calculation rules. Stored on every [`DailyValue`]
/// so values computed by an older rule set can be found and recomputed.
pub const CALCULATION_VERSION: u32 = 1;

/// The source of a break deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    /// A break the employee booked.
    Booked,
    /// A fixed break window from the day plan.
    Fixed,
    /// A variable break from the day plan's threshold table.
    Variable,
    /// A top-up to the plan's minimum break.
    Minimum,
}

/// One applied break deduction, kept for auditability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakDetail {
    /// Which rule produced the deduction.
    #[serde(rename = "type")]
    pub kind: BreakKind,
    /// Minutes deducted from gross time.
    pub minutes: i32,
    /// Human-readable explanation.
    pub reason: String,
}

/// Time-accounting figures for one employee-day.
///
/// Fully derived from bookings, absences and the day plan; each run
/// overwrites the previous value for the same key.
///
/// Invariants: `net_time == gross_time - break_time`,
/// `overtime == max(0, net_time - target_time)`,
/// `undertime == max(0, target_time - net_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyValue {
    /// The employee.
    pub employee_id: String,
    /// The calendar day.
    pub date: NaiveDate,
    /// Credited work time before break deduction.
    pub gross_time: i32,
    /// Credited work time after break deduction.
    pub net_time: i32,
    /// Expected net time.
    pub target_time: i32,
    /// Net time above target.
    pub overtime: i32,
    /// Net time below target.
    pub undertime: i32,
    /// Total break deduction.
    pub break_time: i32,
    /// Minutes removed by the maximum net time cap.
    pub capped_time: i32,
    /// Minutes credited by a holiday or absence.
    pub credited_time: i32,
    /// Errors found for the day.
    pub errors: BTreeSet<ErrorCode>,
    /// Warnings recorded for the day.
    pub warnings: BTreeSet<WarningCode>,
    /// True if `errors` is not empty.
    pub has_error: bool,
    /// First credited arrival, if any.
    pub first_arrival: Option<i32>,
    /// Last credited departure, if any.
    pub last_departure: Option<i32>,
    /// Number of real bookings on the day.
    pub booking_count: u32,
    /// True if the day is a holiday.
    pub is_holiday: bool,
    /// The absence recorded for the day, if any.
    pub absence: Option<AbsenceKind>,
    /// The rule version that produced this value.
    pub calculation_version: u32,
}

impl DailyValue {
    /// Creates an empty value for `employee_id` on `date`.
    pub fn empty(employee_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
            gross_time: 0,
            net_time: 0,
            target_time: 0,
            overtime: 0,
            undertime: 0,
            break_time: 0,
            capped_time: 0,
            credited_time: 0,
            errors: BTreeSet::new(),
            warnings: BTreeSet::new(),
            has_error: false,
            first_arrival: None,
            last_departure: None,
            booking_count: 0,
            is_holiday: false,
            absence: None,
            calculation_version: CALCULATION_VERSION,
        }
    }

    /// Replaces the error and warning sets with `notes`.
    pub fn with_notes(mut self, notes: CalculationNotes) -> Self {
        self.has_error = notes.has_errors();
        self.errors = notes.errors;
        self.warnings = notes.warnings;
        self
    }

    /// Returns true if the day counts as worked (at least one booking).
    pub fn is_work_day(&self) -> bool {
        self.booking_count > 0
    }

    /// Checks the arithmetic invariants of the value.
    ///
    /// ```
    /// use worktime_engine::models::DailyValue;
    /// use chrono::NaiveDate;
    ///
    /// let mut value = DailyValue::empty("emp_001", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    /// value.gross_time = 540;
    /// value.break_time = 30;
    /// value.net_time = 510;
    /// value.target_time = 480;
    /// value.overtime = 30;
    /// assert!(value.satisfies_invariants());
    /// ```
    pub fn satisfies_invariants(&self) -> bool {
        self.net_time == self.gross_time - self.break_time
            && self.overtime == (self.net_time - self.target_time).max(0)
            && self.undertime == (self.target_time - self.net_time).max(0)
            && (self.overtime == 0 || self.undertime == 0)
    }
}
