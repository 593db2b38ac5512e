//! Monthly aggregation and month closing.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::calculation::aggregate_month;
use crate::error::{EngineError, EngineResult};
use crate::models::MonthlyValue;

use super::CalculationService;

/// Returns the first and last day of a month.
///
/// ```
/// use worktime_engine::service::month_bounds;
/// use chrono::NaiveDate;
///
/// let (first, last) = month_bounds(2028, 2).unwrap();
/// assert_eq!(first, NaiveDate::from_ymd_opt(2028, 2, 1).unwrap());
/// assert_eq!(last, NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
/// assert!(month_bounds(2026, 13).is_err());
/// ```
pub fn month_bounds(year: i32, month: u32) -> EngineResult<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidPeriod {
        message: format!("{}-{:02} is not a valid month", year, month),
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

impl CalculationService {
    /// Aggregates the stored daily values of a month and stores the result.
    ///
    /// The opening balance is the previous month's carryover (0 if that
    /// month was never calculated). A stored value's closed state is kept.
    pub fn calculate_month(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> EngineResult<MonthlyValue> {
        let (first, last) = month_bounds(year, month)?;
        let lock = self.month_lock(employee_id, year, month);
        let _guard = lock.lock();
        self.ensure_month_open(employee_id, year, month)?;

        let rules = self
            .stores
            .evaluation_rules
            .evaluation_rules(employee_id)?
            .ok_or_else(|| EngineError::EvaluationRulesNotFound {
                employee_id: employee_id.to_string(),
            })?;
        rules.validate()?;

        let (prev_year, prev_month) = previous_month(year, month);
        let carryover = self
            .stores
            .values
            .monthly_value(employee_id, prev_year, prev_month)?
            .map(|m| m.flextime_carryover)
            .unwrap_or(0);

        let daily_values = self
            .stores
            .values
            .daily_values_between(employee_id, first, last)?;
        let absences = self
            .stores
            .absences
            .absences_between(employee_id, first, last)?;

        let mut value = aggregate_month(
            employee_id,
            year,
            month,
            &daily_values,
            &absences,
            carryover,
            &rules,
        );
        if let Some(existing) = self.stores.values.monthly_value(employee_id, year, month)? {
            value.carry_state_from(&existing);
        }
        self.stores.values.put_monthly_value(value.clone())?;

        info!(
            employee_id,
            year,
            month,
            days = daily_values.len(),
            flextime_start = value.flextime_start,
            flextime_change = value.flextime_change,
            flextime_end = value.flextime_end,
            forfeited = value.forfeited_time,
            "Monthly value calculated"
        );
        Ok(value)
    }

    /// Seals a month: later daily and monthly recalculation is rejected
    /// until it is reopened.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MonthlyValueNotFound`] if the month was never calculated
    /// - [`EngineError::InvalidStateTransition`] if it is already closed
    pub fn close_month(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
        closed_by: &str,
    ) -> EngineResult<MonthlyValue> {
        let lock = self.month_lock(employee_id, year, month);
        let _guard = lock.lock();
        let mut value = self.stored_month(employee_id, year, month)?;
        if value.is_closed {
            warn!(employee_id, year, month, "Close rejected: month already closed");
            return Err(EngineError::InvalidStateTransition {
                message: format!("{}-{:02} is already closed", year, month),
            });
        }
        value.is_closed = true;
        value.closed_at = Some(Utc::now());
        value.closed_by = Some(closed_by.to_string());
        self.stores.values.put_monthly_value(value.clone())?;

        info!(employee_id, year, month, closed_by, "Month closed");
        Ok(value)
    }

    /// Unseals a closed month.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MonthlyValueNotFound`] if the month was never calculated
    /// - [`EngineError::InvalidStateTransition`] if it is not closed
    pub fn reopen_month(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
        reopened_by: &str,
    ) -> EngineResult<MonthlyValue> {
        let lock = self.month_lock(employee_id, year, month);
        let _guard = lock.lock();
        let mut value = self.stored_month(employee_id, year, month)?;
        if !value.is_closed {
            warn!(employee_id, year, month, "Reopen rejected: month is open");
            return Err(EngineError::InvalidStateTransition {
                message: format!("{}-{:02} is not closed", year, month),
            });
        }
        value.is_closed = false;
        value.reopened_at = Some(Utc::now());
        value.reopened_by = Some(reopened_by.to_string());
        self.stores.values.put_monthly_value(value.clone())?;

        info!(employee_id, year, month, reopened_by, "Month reopened");
        Ok(value)
    }

    fn stored_month(&self, employee_id: &str, year: i32, month: u32) -> EngineResult<MonthlyValue> {
        month_bounds(year, month)?;
        self.stores
            .values
            .monthly_value(employee_id, year, month)?
            .ok_or_else(|| EngineError::MonthlyValueNotFound {
                employee_id: employee_id.to_string(),
                year,
                month,
            })
    }
}
