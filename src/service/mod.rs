//! Calculation service: the operations exposed to callers.
//!
//! [`CalculationService`] orchestrates the calculation stages over the
//! collaborator traits in [`store`](crate::store): it calculates and
//! persists daily and monthly values and manages month closing.
//! [`RecalcQueue`] runs those calculations asynchronously on a bounded,
//! per-employee ordered work queue.

mod daily;
mod monthly;
mod recalc;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::config::HolidayAverageSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::DayPlanConfig;
use crate::store::{
    AbsenceStore, BookingStore, DayPlanResolver, EvaluationRulesStore, HolidayCalendar, ValueStore,
};

pub use monthly::month_bounds;
pub use recalc::{RecalcJob, RecalcQueue};

/// The external collaborators a [`CalculationService`] reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    /// Raw bookings; calculated times are written back here.
    pub bookings: Arc<dyn BookingStore>,
    /// Day plan assignment.
    pub day_plans: Arc<dyn DayPlanResolver>,
    /// Holiday calendar.
    pub holidays: Arc<dyn HolidayCalendar>,
    /// Absences.
    pub absences: Arc<dyn AbsenceStore>,
    /// Monthly evaluation rules.
    pub evaluation_rules: Arc<dyn EvaluationRulesStore>,
    /// Computed daily and monthly values.
    pub values: Arc<dyn ValueStore>,
}

impl Collaborators {
    /// Uses one store for every collaborator.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: BookingStore
            + DayPlanResolver
            + HolidayCalendar
            + AbsenceStore
            + EvaluationRulesStore
            + ValueStore
            + 'static,
    {
        Self {
            bookings: store.clone(),
            day_plans: store.clone(),
            holidays: store.clone(),
            absences: store.clone(),
            evaluation_rules: store.clone(),
            values: store,
        }
    }
}

/// Calculates daily and monthly values.
///
/// All operations are synchronous and safe to call from several threads at
/// once. Each write replaces the stored value for its key as a whole.
/// Writes into one employee-month are serialized with closing and reopening
/// it, and the month's closed state is re-checked under that lock, so no
/// value lands in a month after it was closed.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use worktime_engine::config::HolidayAverageSettings;
/// use worktime_engine::models::{Booking, BookingCategory, BookingDirection, DayPlanConfig};
/// use worktime_engine::service::{CalculationService, Collaborators};
/// use worktime_engine::store::MemoryStore;
/// use chrono::NaiveDate;
///
/// let store = Arc::new(MemoryStore::new());
/// store.set_default_day_plan(DayPlanConfig::with_target("std", 480));
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// store.add_booking(Booking::new("emp_001", date, BookingDirection::In, BookingCategory::Work, 480));
/// store.add_booking(Booking::new("emp_001", date, BookingDirection::Out, BookingCategory::Work, 1020));
///
/// let service = CalculationService::new(
///     Collaborators::from_store(store),
///     HolidayAverageSettings::default(),
/// );
/// let result = service.calculate_day("emp_001", date).unwrap();
/// assert_eq!(result.value.net_time, 540);
/// assert_eq!(result.value.overtime, 60);
/// ```
pub struct CalculationService {
    stores: Collaborators,
    holiday_average: HolidayAverageSettings,
    month_locks: Mutex<HashMap<(String, i32, u32), Arc<Mutex<()>>>>,
}

impl CalculationService {
    /// Creates a service over the given collaborators.
    pub fn new(stores: Collaborators, holiday_average: HolidayAverageSettings) -> Self {
        Self {
            stores,
            holiday_average,
            month_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Runs one queued recalculation.
    pub fn run_job(&self, job: &RecalcJob) -> EngineResult<()> {
        match job {
            RecalcJob::Day { employee_id, date } => {
                self.calculate_day(employee_id, *date).map(|_| ())
            }
            RecalcJob::Month {
                employee_id,
                year,
                month,
            } => self.calculate_month(employee_id, *year, *month).map(|_| ()),
        }
    }

    /// The lock guarding the persisted state of one employee-month.
    fn month_lock(&self, employee_id: &str, year: i32, month: u32) -> Arc<Mutex<()>> {
        self.month_locks
            .lock()
            .entry((employee_id.to_string(), year, month))
            .or_default()
            .clone()
    }

    /// Fails with [`EngineError::MonthClosed`] if the month is closed.
    fn ensure_month_open(&self, employee_id: &str, year: i32, month: u32) -> EngineResult<()> {
        let closed = self
            .stores
            .values
            .monthly_value(employee_id, year, month)?
            .is_some_and(|m| m.is_closed);
        if closed {
            return Err(EngineError::MonthClosed {
                employee_id: employee_id.to_string(),
                year,
                month,
            });
        }
        Ok(())
    }

    /// Resolves and validates the plan for an employee-day.
    fn day_plan_for(&self, employee_id: &str, date: NaiveDate) -> EngineResult<DayPlanConfig> {
        let plan = self
            .stores
            .day_plans
            .day_plan(employee_id, date)?
            .ok_or_else(|| EngineError::DayPlanNotFound {
                employee_id: employee_id.to_string(),
                date,
            })?;
        plan.validate()?;
        Ok(plan)
    }
}
