//! Collaborator interfaces consumed by the calculation service.
//!
//! The engine does not own persistence. Bookings, day plans, holidays,
//! absences, evaluation rules and computed values are read and written
//! through these traits; [`MemoryStore`] implements all of them in memory.
//!
//! Implementations must be thread-safe: the recalculation queue calls them
//! from several workers at once. A failure that may succeed on retry should
//! be reported as [`EngineError::StoreUnavailable`](crate::error::EngineError::StoreUnavailable).

mod memory;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    Absence, Booking, DailyValue, DayPlanConfig, MonthlyEvaluationRules, MonthlyValue,
};

pub use memory::MemoryStore;

/// Raw bookings of employees.
pub trait BookingStore: Send + Sync {
    /// Returns the bookings owned by `date`, in insertion order.
    fn bookings_for_day(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Vec<Booking>>;

    /// Writes the engine's calculated time for each listed booking.
    fn update_calculated_times(
        &self,
        employee_id: &str,
        date: NaiveDate,
        updates: &[(Uuid, i32)],
    ) -> EngineResult<()>;
}

/// Resolves the day plan that applies to an employee-day.
pub trait DayPlanResolver: Send + Sync {
    /// Returns the plan for `date`, or `None` if no plan is assigned.
    fn day_plan(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<DayPlanConfig>>;
}

/// Public holidays as they apply to an employee.
pub trait HolidayCalendar: Send + Sync {
    /// Returns true if `date` is a holiday for the employee.
    fn is_holiday(&self, employee_id: &str, date: NaiveDate) -> EngineResult<bool>;

    /// Returns every holiday in `from..=to`.
    fn holidays_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<BTreeSet<NaiveDate>>;
}

/// Recorded absences (vacation, sickness, ...).
pub trait AbsenceStore: Send + Sync {
    /// Returns the absence recorded for `date`, if any.
    fn absence_on(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<Absence>>;

    /// Returns every absence in `from..=to`, ordered by date.
    fn absences_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<Absence>>;
}

/// Monthly evaluation policy per employee.
pub trait EvaluationRulesStore: Send + Sync {
    /// Returns the rules that apply to the employee, if any are configured.
    fn evaluation_rules(&self, employee_id: &str) -> EngineResult<Option<MonthlyEvaluationRules>>;
}

/// Computed daily and monthly values.
///
/// Every `put` replaces the stored value for its key as a whole.
pub trait ValueStore: Send + Sync {
    /// Returns the stored daily value.
    fn daily_value(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<DailyValue>>;

    /// Returns the stored daily values in `from..=to`, ordered by date.
    fn daily_values_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<DailyValue>>;

    /// Stores a daily value.
    fn put_daily_value(&self, value: DailyValue) -> EngineResult<()>;

    /// Returns the stored monthly value.
    fn monthly_value(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> EngineResult<Option<MonthlyValue>>;

    /// Stores a monthly value.
    fn put_monthly_value(&self, value: MonthlyValue) -> EngineResult<()>;
}
