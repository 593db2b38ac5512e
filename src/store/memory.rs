//! In-memory implementation of every collaborator trait.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Absence, Booking, DailyValue, DayPlanConfig, MonthlyEvaluationRules, MonthlyValue,
};

use super::{
    AbsenceStore, BookingStore, DayPlanResolver, EvaluationRulesStore, HolidayCalendar, ValueStore,
};

type DayKey = (String, NaiveDate);

/// A thread-safe store backed by maps behind `parking_lot` locks.
///
/// Used by tests, benchmarks and the demo server. `fail_next` makes the next
/// booking reads fail with [`EngineError::StoreUnavailable`] to exercise
/// retry paths.
///
/// # Example
///
/// ```
/// use worktime_engine::models::{Booking, BookingCategory, BookingDirection};
/// use worktime_engine::store::{BookingStore, MemoryStore};
/// use chrono::NaiveDate;
///
/// let store = MemoryStore::new();
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// store.add_booking(Booking::new("emp_001", date, BookingDirection::In, BookingCategory::Work, 480));
///
/// assert_eq!(store.bookings_for_day("emp_001", date).unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    bookings: RwLock<HashMap<DayKey, Vec<Booking>>>,
    plans: RwLock<HashMap<DayKey, DayPlanConfig>>,
    default_plan: RwLock<Option<DayPlanConfig>>,
    holidays: RwLock<BTreeSet<NaiveDate>>,
    absences: RwLock<BTreeMap<DayKey, Absence>>,
    rules: RwLock<HashMap<String, MonthlyEvaluationRules>>,
    default_rules: RwLock<Option<MonthlyEvaluationRules>>,
    daily: RwLock<BTreeMap<DayKey, DailyValue>>,
    monthly: RwLock<BTreeMap<(String, i32, u32), MonthlyValue>>,
    pending_failures: AtomicU32,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a booking to its employee-day.
    pub fn add_booking(&self, booking: Booking) {
        let key = (booking.employee_id.clone(), booking.date);
        self.bookings.write().entry(key).or_default().push(booking);
    }

    /// Assigns a plan to one employee-day.
    pub fn set_day_plan(&self, employee_id: &str, date: NaiveDate, plan: DayPlanConfig) {
        self.plans.write().insert((employee_id.to_string(), date), plan);
    }

    /// Sets the plan used for every day without an explicit assignment.
    pub fn set_default_day_plan(&self, plan: DayPlanConfig) {
        *self.default_plan.write() = Some(plan);
    }

    /// Marks `date` as a holiday for every employee.
    pub fn add_holiday(&self, date: NaiveDate) {
        self.holidays.write().insert(date);
    }

    /// Records an absence.
    pub fn add_absence(&self, employee_id: &str, absence: Absence) {
        self.absences
            .write()
            .insert((employee_id.to_string(), absence.date), absence);
    }

    /// Sets the evaluation rules of one employee.
    pub fn set_evaluation_rules(&self, employee_id: &str, rules: MonthlyEvaluationRules) {
        self.rules.write().insert(employee_id.to_string(), rules);
    }

    /// Sets the rules used for employees without their own.
    pub fn set_default_evaluation_rules(&self, rules: MonthlyEvaluationRules) {
        *self.default_rules.write() = Some(rules);
    }

    /// Makes the next `count` booking reads fail as unavailable.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    fn check_available(&self) -> EngineResult<()> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(EngineError::StoreUnavailable {
                message: "booking store temporarily unavailable".to_string(),
            }),
            Err(_) => Ok(()),
        }
    }
}

impl BookingStore for MemoryStore {
    fn bookings_for_day(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Vec<Booking>> {
        self.check_available()?;
        Ok(self
            .bookings
            .read()
            .get(&(employee_id.to_string(), date))
            .cloned()
            .unwrap_or_default())
    }

    fn update_calculated_times(
        &self,
        employee_id: &str,
        date: NaiveDate,
        updates: &[(Uuid, i32)],
    ) -> EngineResult<()> {
        let mut bookings = self.bookings.write();
        if let Some(day) = bookings.get_mut(&(employee_id.to_string(), date)) {
            for booking in day.iter_mut() {
                if let Some((_, time)) = updates.iter().find(|(id, _)| *id == booking.id) {
                    booking.calculated_time = Some(*time);
                }
            }
        }
        Ok(())
    }
}

impl DayPlanResolver for MemoryStore {
    fn day_plan(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<DayPlanConfig>> {
        let assigned = self
            .plans
            .read()
            .get(&(employee_id.to_string(), date))
            .cloned();
        Ok(assigned.or_else(|| self.default_plan.read().clone()))
    }
}

impl HolidayCalendar for MemoryStore {
    fn is_holiday(&self, _employee_id: &str, date: NaiveDate) -> EngineResult<bool> {
        Ok(self.holidays.read().contains(&date))
    }

    fn holidays_between(
        &self,
        _employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<BTreeSet<NaiveDate>> {
        if from > to {
            return Ok(BTreeSet::new());
        }
        Ok(self.holidays.read().range(from..=to).copied().collect())
    }
}

impl AbsenceStore for MemoryStore {
    fn absence_on(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<Absence>> {
        Ok(self
            .absences
            .read()
            .get(&(employee_id.to_string(), date))
            .cloned())
    }

    fn absences_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<Absence>> {
        if from > to {
            return Ok(Vec::new());
        }
        let range = (employee_id.to_string(), from)..=(employee_id.to_string(), to);
        Ok(self.absences.read().range(range).map(|(_, a)| a.clone()).collect())
    }
}

impl EvaluationRulesStore for MemoryStore {
    fn evaluation_rules(&self, employee_id: &str) -> EngineResult<Option<MonthlyEvaluationRules>> {
        let own = self.rules.read().get(employee_id).copied();
        Ok(own.or(*self.default_rules.read()))
    }
}

impl ValueStore for MemoryStore {
    fn daily_value(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<DailyValue>> {
        Ok(self
            .daily
            .read()
            .get(&(employee_id.to_string(), date))
            .cloned())
    }

    fn daily_values_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<DailyValue>> {
        if from > to {
            return Ok(Vec::new());
        }
        let range = (employee_id.to_string(), from)..=(employee_id.to_string(), to);
        Ok(self.daily.read().range(range).map(|(_, v)| v.clone()).collect())
    }

    fn put_daily_value(&self, value: DailyValue) -> EngineResult<()> {
        self.daily
            .write()
            .insert((value.employee_id.clone(), value.date), value);
        Ok(())
    }

    fn monthly_value(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> EngineResult<Option<MonthlyValue>> {
        Ok(self
            .monthly
            .read()
            .get(&(employee_id.to_string(), year, month))
            .cloned())
    }

    fn put_monthly_value(&self, value: MonthlyValue) -> EngineResult<()> {
        self.monthly
            .write()
            .insert((value.employee_id.clone(), value.year, value.month), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbsenceKind, BookingCategory, BookingDirection};
    use rust_decimal::Decimal;

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_bookings_keep_insertion_order() {
        let store = MemoryStore::new();
        let date = make_date("2026-03-02");
        let first = Booking::new("emp_001", date, BookingDirection::Out, BookingCategory::Work, 480);
        let second = Booking::new("emp_001", date, BookingDirection::In, BookingCategory::Work, 480);
        store.add_booking(first.clone());
        store.add_booking(second.clone());

        let bookings = store.bookings_for_day("emp_001", date).unwrap();
        assert_eq!(bookings[0].id, first.id);
        assert_eq!(bookings[1].id, second.id);
        assert!(store.bookings_for_day("emp_002", date).unwrap().is_empty());
    }

    #[test]
    fn test_update_calculated_times() {
        let store = MemoryStore::new();
        let date = make_date("2026-03-02");
        let booking = Booking::new("emp_001", date, BookingDirection::In, BookingCategory::Work, 477);
        store.add_booking(booking.clone());

        store
            .update_calculated_times("emp_001", date, &[(booking.id, 480)])
            .unwrap();
        let stored = store.bookings_for_day("emp_001", date).unwrap();
        assert_eq!(stored[0].calculated_time, Some(480));
        assert_eq!(stored[0].edited_time, 477);
    }

    #[test]
    fn test_assigned_plan_overrides_default() {
        let store = MemoryStore::new();
        let date = make_date("2026-03-02");
        assert!(store.day_plan("emp_001", date).unwrap().is_none());

        store.set_default_day_plan(DayPlanConfig::with_target("std", 480));
        store.set_day_plan("emp_001", date, DayPlanConfig::with_target("short", 240));

        assert_eq!(store.day_plan("emp_001", date).unwrap().unwrap().code, "short");
        assert_eq!(
            store
                .day_plan("emp_001", make_date("2026-03-03"))
                .unwrap()
                .unwrap()
                .code,
            "std"
        );
    }

    #[test]
    fn test_range_queries_are_per_employee_and_inclusive() {
        let store = MemoryStore::new();
        for (employee, day) in [("emp_001", 1), ("emp_001", 31), ("emp_002", 15)] {
            let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
            store.put_daily_value(DailyValue::empty(employee, date)).unwrap();
            store.add_absence(
                employee,
                Absence {
                    date,
                    kind: AbsenceKind::Sickness,
                    portion: Decimal::ONE,
                },
            );
        }

        let values = store
            .daily_values_between("emp_001", make_date("2026-03-01"), make_date("2026-03-31"))
            .unwrap();
        assert_eq!(values.len(), 2);

        let absences = store
            .absences_between("emp_002", make_date("2026-03-01"), make_date("2026-03-31"))
            .unwrap();
        assert_eq!(absences.len(), 1);
    }

    #[test]
    fn test_fail_next_fails_exactly_n_reads() {
        let store = MemoryStore::new();
        let date = make_date("2026-03-02");
        store.fail_next(2);

        assert!(matches!(
            store.bookings_for_day("emp_001", date),
            Err(EngineError::StoreUnavailable { .. })
        ));
        assert!(store.bookings_for_day("emp_001", date).is_err());
        assert!(store.bookings_for_day("emp_001", date).is_ok());
    }

    #[test]
    fn test_holidays_between() {
        let store = MemoryStore::new();
        store.add_holiday(make_date("2026-01-01"));
        store.add_holiday(make_date("2026-04-03"));

        let holidays = store
            .holidays_between("emp_001", make_date("2026-01-01"), make_date("2026-03-31"))
            .unwrap();
        assert_eq!(holidays.len(), 1);
        assert!(store.is_holiday("emp_001", make_date("2026-04-03")).unwrap());
    }

    #[test]
    fn test_default_rules_fallback() {
        let store = MemoryStore::new();
        assert!(store.evaluation_rules("emp_001").unwrap().is_none());

        store.set_default_evaluation_rules(MonthlyEvaluationRules::default());
        assert!(store.evaluation_rules("emp_001").unwrap().is_some());
    }
}
