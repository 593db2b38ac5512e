//! Calculation stages of the work-time accounting engine.
//!
//! Each stage is a pure function over minute values that returns its result
//! together with an [`AuditStep`](crate::models::AuditStep). The daily
//! pipeline runs pairing, tolerance and rounding, day-change resolution,
//! break deduction, gross/net/target calculation (with holiday credit) and
//! error detection; the monthly stage aggregates daily values and applies
//! the flextime credit policy.

mod break_deduction;
mod day_change;
mod error_detection;
mod holiday_credit;
mod monthly;
mod normalization;
mod pairing;
mod rounding;
mod time_totals;
mod tolerance;

pub use break_deduction::{BreakDeduction, deduct_breaks};
pub use day_change::{DayChangeResolution, resolve_day_change};
pub use error_detection::{ErrorDetection, detect_errors};
pub use holiday_credit::{
    DEFAULT_AVERAGE_WEEKS, DEFAULT_MIN_SAMPLE_DAYS, HolidayAverage, HolidayCreditResult,
    calculate_holiday_average, holiday_credit_minutes,
};
pub use monthly::{FlextimeCredit, aggregate_month, apply_annual_floor, apply_credit_policy};
pub use normalization::{BookingAdjustment, NormalizedDay, normalize_day};
pub use pairing::{PairingResult, UnmatchedBooking, pair_bookings};
pub use rounding::apply_rounding;
pub use time_totals::{TimeTotals, calculate_time_totals};
pub use tolerance::apply_tolerance;
