//! Day-change resolution for shifts crossing midnight.
//!
//! A shift that starts on day N and ends on day N+1 shows up as an open
//! arrival (tail) on day N and an open departure (head) on day N+1. This
//! module decides which day each part of the shift is credited to.

use serde::{Deserialize, Serialize};

use crate::models::{
    AuditStep, BookingPair, BookingRef, CalculationNotes, DayChangePolicy, MINUTES_PER_DAY,
    PairEdge, PairKind, WarningCode,
};

/// The credited intervals of one midnight-crossing shift.
///
/// Times of `arrival_day` are relative to day N, times of `departure_day`
/// to day N+1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayChangeResolution {
    /// The interval credited to the arrival day, if any.
    pub arrival_day: Option<BookingPair>,
    /// The interval credited to the departure day, if any.
    pub departure_day: Option<BookingPair>,
    /// Total real elapsed minutes of the shift.
    pub total_minutes: i32,
    /// Warnings that apply to both days.
    pub notes: CalculationNotes,
    /// The audit step recording the decision.
    pub audit_step: AuditStep,
}

/// Resolves a shift from `arrival` on day N to `departure` on day N+1.
///
/// - `None`: day N gets `[arrival, 1440]`, day N+1 gets `[0, departure]`.
/// - `AtArrival`: day N gets the whole shift, `[arrival, arrival + total]`.
/// - `AtDeparture`: day N+1 gets the whole shift, `[departure - total, departure]`.
/// - `AutoComplete`: splits like `None` using a synthetic departure at the end
///   of day N (shown as 23:59, counted to midnight) and a synthetic arrival at
///   00:00, and records `DAY_CHANGE_AUTO_COMPLETE`.
///
/// Synthetic boundaries are marked with [`PairEdge::Synthetic`] and never
/// written back to bookings.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::resolve_day_change;
/// use worktime_engine::models::{BookingRef, DayChangePolicy, WarningCode};
/// use uuid::Uuid;
///
/// let arrival = BookingRef { booking_id: Uuid::new_v4(), time: 1320 };
/// let departure = BookingRef { booking_id: Uuid::new_v4(), time: 360 };
///
/// let result = resolve_day_change(DayChangePolicy::AutoComplete, arrival, departure, 1);
/// assert_eq!(result.arrival_day.unwrap().duration(), 120);
/// assert_eq!(result.departure_day.unwrap().duration(), 360);
/// assert!(result.notes.warnings.contains(&WarningCode::DayChangeAutoComplete));
/// ```
pub fn resolve_day_change(
    policy: DayChangePolicy,
    arrival: BookingRef,
    departure: BookingRef,
    step_number: u32,
) -> DayChangeResolution {
    let total_minutes = MINUTES_PER_DAY - arrival.time + departure.time;

    let split_arrival_day = BookingPair {
        kind: PairKind::Work,
        start: arrival.time,
        end: MINUTES_PER_DAY,
        start_edge: PairEdge::Booking(arrival.booking_id),
        end_edge: PairEdge::Synthetic,
    };
    let split_departure_day = BookingPair {
        kind: PairKind::Work,
        start: 0,
        end: departure.time,
        start_edge: PairEdge::Synthetic,
        end_edge: PairEdge::Booking(departure.booking_id),
    };

    let (arrival_day, departure_day, notes, reasoning) = match policy {
        DayChangePolicy::None => (
            Some(split_arrival_day),
            Some(split_departure_day),
            CalculationNotes::default(),
            "Split at midnight".to_string(),
        ),
        DayChangePolicy::AutoComplete => (
            Some(split_arrival_day),
            Some(split_departure_day),
            CalculationNotes::default().with_warning(WarningCode::DayChangeAutoComplete),
            "Split at midnight with synthetic 23:59 departure and 00:00 arrival".to_string(),
        ),
        DayChangePolicy::AtArrival => (
            Some(BookingPair {
                kind: PairKind::Work,
                start: arrival.time,
                end: arrival.time + total_minutes,
                start_edge: PairEdge::Booking(arrival.booking_id),
                end_edge: PairEdge::Synthetic,
            }),
            None,
            CalculationNotes::default(),
            format!("All {} minutes credited to the arrival day", total_minutes),
        ),
        DayChangePolicy::AtDeparture => (
            None,
            Some(BookingPair {
                kind: PairKind::Work,
                start: departure.time - total_minutes,
                end: departure.time,
                start_edge: PairEdge::Synthetic,
                end_edge: PairEdge::Booking(departure.booking_id),
            }),
            CalculationNotes::default(),
            format!("All {} minutes credited to the departure day", total_minutes),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "day_change".to_string(),
        rule_name: "Day Change Resolution".to_string(),
        input: serde_json::json!({
            "policy": policy,
            "arrival": arrival.time,
            "departure": departure.time
        }),
        output: serde_json::json!({
            "total_minutes": total_minutes,
            "arrival_day_minutes": arrival_day.map(|p| p.duration()).unwrap_or(0),
            "departure_day_minutes": departure_day.map(|p| p.duration()).unwrap_or(0)
        }),
        reasoning,
    };

    DayChangeResolution {
        arrival_day,
        departure_day,
        total_minutes,
        notes,
        audit_step,
    }
}
