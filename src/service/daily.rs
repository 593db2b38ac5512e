//! Daily calculation: runs the stage pipeline for one employee-day.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use chrono::{Datelike, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    HolidayAverage, calculate_holiday_average, calculate_time_totals, deduct_breaks, detect_errors,
    holiday_credit_minutes, normalize_day, pair_bookings, resolve_day_change,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AbsenceKind, AuditStep, AuditTrace, Booking, BookingRef, CALCULATION_VERSION, CalculationNotes,
    DailyCalculation, DailyValue, DayPlanConfig, ErrorCode, HolidayCredit, MINUTES_PER_DAY, PairEdge,
    PairKind,
};

use super::CalculationService;

/// Unmatched day-boundary bookings of a neighbouring day.
struct OpenEnds {
    tail: Option<BookingRef>,
    head: Option<BookingRef>,
}

impl CalculationService {
    /// Calculates, stores and returns the daily value of an employee-day.
    ///
    /// The run reads bookings, the day plan, holiday and absence data and
    /// the neighbouring days' boundary bookings, writes the calculated time
    /// of every booking back to the booking store and replaces the stored
    /// daily value. Running it twice on unchanged inputs gives the same
    /// value.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MonthClosed`] if the date's month is closed
    /// - [`EngineError::DayPlanNotFound`] if no plan applies to the date
    /// - [`EngineError::InvalidDayPlan`] if the day's or a neighbouring
    ///   day's plan fails validation
    /// - [`EngineError::InvalidBooking`] if a booking time of the day or a
    ///   neighbouring day lies outside 0..1440
    /// - Any error raised by a collaborator
    pub fn calculate_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<DailyCalculation> {
        let started = Instant::now();

        self.ensure_month_open(employee_id, date.year(), date.month())?;
        let plan = self.day_plan_for(employee_id, date)?;
        let bookings = self.raw_bookings(employee_id, date)?;

        let mut steps = Vec::new();
        let mut notes = Vec::new();
        let mut step_number: u32 = 1;

        // Step 1: Pair bookings
        let pairing = pair_bookings(&bookings, step_number);
        step_number += 1;
        debug!(
            employee_id,
            %date,
            pairs = pairing.pairs.len(),
            unmatched = pairing.unmatched.len(),
            "Bookings paired"
        );
        steps.push(pairing.audit_step);
        notes.push(pairing.notes);

        // Step 2: Tolerance and rounding
        let normalized = normalize_day(
            &pairing.pairs,
            pairing.tail,
            pairing.head,
            &plan,
            step_number,
        );
        step_number += 1;
        steps.push(normalized.audit_step.clone());
        let mut pairs = normalized.pairs.clone();

        // Step 3: Shifts crossing midnight
        if let Some(tail) = normalized.tail {
            let next_day = date.succ_opt().ok_or_else(|| out_of_range(date))?;
            let next_plan = self.neighbour_plan(employee_id, next_day)?;
            match self.open_ends(employee_id, next_day, next_plan.as_ref())?.head {
                Some(head) => {
                    let resolution = resolve_day_change(plan.day_change, tail, head, step_number);
                    step_number += 1;
                    pairs.extend(resolution.arrival_day);
                    notes.push(resolution.notes);
                    steps.push(resolution.audit_step);
                }
                None => notes.push(CalculationNotes::default().with_error(ErrorCode::MissingGo)),
            }
        }
        if let Some(head) = normalized.head {
            let previous_day = date.pred_opt().ok_or_else(|| out_of_range(date))?;
            let previous_plan = self.neighbour_plan(employee_id, previous_day)?;
            match self
                .open_ends(employee_id, previous_day, previous_plan.as_ref())?
                .tail
            {
                Some(tail) => {
                    let policy = previous_plan.map(|p| p.day_change).unwrap_or_default();
                    let resolution = resolve_day_change(policy, tail, head, step_number);
                    step_number += 1;
                    pairs.extend(resolution.departure_day);
                    notes.push(resolution.notes);
                    steps.push(resolution.audit_step);
                }
                None => notes.push(CalculationNotes::default().with_error(ErrorCode::MissingCome)),
            }
        }
        pairs.sort_by_key(|p| (p.start, p.end));

        // Step 4: Breaks
        let breaks = deduct_breaks(&pairs, &plan.breaks, step_number);
        step_number += 1;
        steps.push(breaks.audit_step);

        // Step 5: Holiday or absence credit
        let is_holiday = self.stores.holidays.is_holiday(employee_id, date)?;
        let absence = self.stores.absences.absence_on(employee_id, date)?;
        let (credited, target) = if is_holiday {
            let average = match plan.holiday_credit {
                HolidayCredit::TrailingAverage => {
                    let average = self.trailing_average(employee_id, date, step_number)?;
                    step_number += 1;
                    steps.push(average.audit_step.clone());
                    Some(average)
                }
                _ => None,
            };
            let credit = holiday_credit_minutes(
                plan.holiday_credit,
                plan.target_minutes,
                average.as_ref(),
                step_number,
            );
            step_number += 1;
            steps.push(credit.audit_step);
            notes.push(credit.notes);
            (credit.minutes, credit.minutes)
        } else if let Some(absence) = &absence {
            let minutes = absence.credited_minutes(plan.target_minutes);
            steps.push(absence_step(absence.kind, &absence.portion, &plan, minutes, step_number));
            step_number += 1;
            (minutes, plan.target_minutes)
        } else {
            (0, plan.target_minutes)
        };

        // Step 6: Totals
        let worked: i32 = pairs
            .iter()
            .filter(|p| p.kind == PairKind::Work)
            .map(|p| p.duration())
            .sum();
        let totals = calculate_time_totals(
            worked,
            credited,
            breaks.total_minutes,
            target,
            plan.max_net_minutes,
            step_number,
        );
        step_number += 1;
        steps.push(totals.audit_step);
        notes.push(totals.notes);

        // Step 7: Error detection
        let own_ids: HashSet<Uuid> = bookings.iter().map(|b| b.id).collect();
        let own_edge = |edge: PairEdge| edge.booking_id().is_some_and(|id| own_ids.contains(&id));
        let work_pairs = || pairs.iter().filter(|p| p.kind == PairKind::Work);
        let first_arrival = work_pairs()
            .filter(|p| own_edge(p.start_edge))
            .map(|p| p.start)
            .min();
        let last_departure = work_pairs()
            .filter(|p| own_edge(p.end_edge))
            .map(|p| p.end)
            .max();
        let detection = detect_errors(
            first_arrival,
            last_departure,
            totals.gross_time + totals.capped_time,
            &plan,
            notes,
            step_number,
        );
        steps.push(detection.audit_step);

        let mut value = DailyValue::empty(employee_id, date);
        value.gross_time = totals.gross_time;
        value.net_time = totals.net_time;
        value.target_time = totals.target_time;
        value.overtime = totals.overtime;
        value.undertime = totals.undertime;
        value.break_time = totals.break_time;
        value.capped_time = totals.capped_time;
        value.credited_time = totals.credited_time;
        value.first_arrival = first_arrival;
        value.last_departure = last_departure;
        value.booking_count = bookings.len() as u32;
        value.is_holiday = is_holiday;
        value.absence = absence.map(|a| a.kind);
        value.calculation_version = CALCULATION_VERSION;
        let value = value.with_notes(detection.notes);

        let updates: Vec<(Uuid, i32)> = bookings
            .iter()
            .map(|b| (b.id, normalized.adjusted_time(b.id).unwrap_or(b.edited_time)))
            .collect();
        {
            let lock = self.month_lock(employee_id, date.year(), date.month());
            let _guard = lock.lock();
            // The month may have been closed while the pipeline ran.
            self.ensure_month_open(employee_id, date.year(), date.month())?;
            self.stores
                .bookings
                .update_calculated_times(employee_id, date, &updates)?;
            self.stores.values.put_daily_value(value.clone())?;
        }

        let duration_us = started.elapsed().as_micros() as u64;
        info!(
            employee_id,
            %date,
            plan = %plan.code,
            net_time = value.net_time,
            overtime = value.overtime,
            undertime = value.undertime,
            errors = value.errors.len(),
            duration_us,
            "Daily value calculated"
        );

        Ok(DailyCalculation {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            value,
            pairs,
            break_details: breaks.details,
            audit_trace: AuditTrace { steps, duration_us },
        })
    }

    /// The neighbouring days whose credit depends on the bookings of `date`:
    /// the previous day if it ends on an open arrival, the next day if it
    /// starts with a departure that has no arrival.
    pub fn linked_days(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Vec<NaiveDate>> {
        let mut days = Vec::new();
        if let Some(previous) = date.pred_opt() {
            let bookings = self.stores.bookings.bookings_for_day(employee_id, previous)?;
            if pair_bookings(&bookings, 0).tail.is_some() {
                days.push(previous);
            }
        }
        if let Some(next) = date.succ_opt() {
            let bookings = self.stores.bookings.bookings_for_day(employee_id, next)?;
            if pair_bookings(&bookings, 0).head.is_some() {
                days.push(next);
            }
        }
        Ok(days)
    }

    /// Loads the bookings of a day with any previously written calculated
    /// time cleared, so every run starts from the edited times.
    ///
    /// Fails with [`EngineError::InvalidBooking`] if an edited time lies
    /// outside the day.
    fn raw_bookings(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Vec<Booking>> {
        let mut bookings = self.stores.bookings.bookings_for_day(employee_id, date)?;
        for booking in &mut bookings {
            if !(0..MINUTES_PER_DAY).contains(&booking.edited_time) {
                warn!(
                    employee_id,
                    %date,
                    booking_id = %booking.id,
                    edited_time = booking.edited_time,
                    "Booking time outside the day"
                );
                return Err(EngineError::InvalidBooking {
                    booking_id: booking.id,
                    message: format!("edited_time {} outside 0..1440", booking.edited_time),
                });
            }
            booking.calculated_time = None;
        }
        Ok(bookings)
    }

    /// The plan of a neighbouring day, validated if there is one.
    fn neighbour_plan(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<DayPlanConfig>> {
        let plan = self.stores.day_plans.day_plan(employee_id, date)?;
        if let Some(plan) = &plan {
            plan.validate()?;
        }
        Ok(plan)
    }

    /// Finds the unmatched boundary bookings of a neighbouring day,
    /// normalized under that day's own plan if it has one.
    fn open_ends(
        &self,
        employee_id: &str,
        date: NaiveDate,
        plan: Option<&DayPlanConfig>,
    ) -> EngineResult<OpenEnds> {
        let bookings = self.raw_bookings(employee_id, date)?;
        let pairing = pair_bookings(&bookings, 0);
        let ends = match plan {
            Some(plan) => {
                let normalized =
                    normalize_day(&pairing.pairs, pairing.tail, pairing.head, plan, 0);
                OpenEnds {
                    tail: normalized.tail,
                    head: normalized.head,
                }
            }
            None => OpenEnds {
                tail: pairing.tail,
                head: pairing.head,
            },
        };
        Ok(ends)
    }

    /// Mean net time over the configured trailing window before `date`.
    fn trailing_average(
        &self,
        employee_id: &str,
        date: NaiveDate,
        step_number: u32,
    ) -> EngineResult<HolidayAverage> {
        let weeks = u64::from(self.holiday_average.weeks);
        let to = date.pred_opt().ok_or_else(|| out_of_range(date))?;
        let from = date
            .checked_sub_days(Days::new(weeks * 7))
            .ok_or_else(|| out_of_range(date))?;

        let history = self
            .stores
            .values
            .daily_values_between(employee_id, from, to)?;
        let holidays = self
            .stores
            .holidays
            .holidays_between(employee_id, from, to)?;
        let absence_dates: BTreeSet<NaiveDate> = self
            .stores
            .absences
            .absences_between(employee_id, from, to)?
            .into_iter()
            .map(|a| a.date)
            .collect();

        Ok(calculate_holiday_average(
            &history,
            &holidays,
            &absence_dates,
            self.holiday_average.min_sample_days,
            step_number,
        ))
    }
}

fn out_of_range(date: NaiveDate) -> EngineError {
    EngineError::InvalidPeriod {
        message: format!("{} has no neighbouring day in the supported range", date),
    }
}

fn absence_step(
    kind: AbsenceKind,
    portion: &Decimal,
    plan: &DayPlanConfig,
    minutes: i32,
    step_number: u32,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "absence_credit".to_string(),
        rule_name: "Absence Credit".to_string(),
        input: json!({
            "kind": kind,
            "portion": portion.to_string(),
            "target_minutes": plan.target_minutes,
        }),
        output: json!({ "credited_minutes": minutes }),
        reasoning: format!(
            "{:?} absence of {} day credits {} of {} target minutes",
            kind, portion, minutes, plan.target_minutes
        ),
    }
}
