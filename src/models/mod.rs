//! Core data models for the work-time accounting engine.
//!
//! This module contains all the domain models used throughout the engine.

mod absence;
mod booking;
mod calculation_result;
mod daily_value;
mod day_plan;
mod monthly_value;
mod notes;

pub use absence::{Absence, AbsenceKind};
pub use booking::{
    Booking, BookingCategory, BookingDirection, BookingPair, BookingRef, MINUTES_PER_DAY,
    PairEdge, PairKind,
};
pub use calculation_result::{AuditStep, AuditTrace, DailyCalculation};
pub use daily_value::{BreakDetail, BreakKind, CALCULATION_VERSION, DailyValue};
pub use day_plan::{
    BreakRule, DayChangePolicy, DayPlanConfig, HolidayCredit, RoundingConfig, RoundingRule,
    ToleranceConfig,
};
pub use monthly_value::{
    AbsenceSummary, CreditType, MonthlyEvaluationRules, MonthlyValue,
};
pub use notes::{CalculationNotes, ErrorCode, WarningCode};
