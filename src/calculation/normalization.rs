//! Boundary normalization.
//!
//! Applies tolerance and rounding to the real work boundaries of one day and
//! reports every booking whose time changed, so the caller can write the
//! result back as the booking's calculated time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AuditStep, BookingPair, BookingRef, DayPlanConfig, PairEdge, PairKind};

use super::rounding::apply_rounding;
use super::tolerance::apply_tolerance;

/// One booking time changed by normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAdjustment {
    /// The booking.
    pub booking_id: Uuid,
    /// Time before normalization.
    pub before: i32,
    /// Time after normalization.
    pub after: i32,
}

/// A day's pairs and open ends after tolerance and rounding.
#[derive(Debug, Clone)]
pub struct NormalizedDay {
    /// Pairs with adjusted work boundaries, ordered by start time.
    pub pairs: Vec<BookingPair>,
    /// The adjusted open arrival at the end of the day.
    pub tail: Option<BookingRef>,
    /// The adjusted open departure at the start of the day.
    pub head: Option<BookingRef>,
    /// Bookings whose time changed.
    pub adjustments: Vec<BookingAdjustment>,
    /// The audit step recording the adjustments.
    pub audit_step: AuditStep,
}

impl NormalizedDay {
    /// Returns the calculated time for `booking_id`, if it was adjusted.
    pub fn adjusted_time(&self, booking_id: Uuid) -> Option<i32> {
        self.adjustments
            .iter()
            .find(|a| a.booking_id == booking_id)
            .map(|a| a.after)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Arrival,
    Departure,
}

#[derive(Debug, Clone, Copy)]
struct Boundary {
    booking_id: Uuid,
    time: i32,
    role: Role,
}

/// Applies the plan's tolerance and rounding to a day's work boundaries.
///
/// Tolerance, then rounding, is applied to the first arrival and the last
/// departure. With `round_all_bookings` every other real work boundary is
/// rounded too; tolerance never applies to inner boundaries. Break pairs and
/// synthetic edges are left untouched. The open `tail` counts as an arrival
/// and the open `head` as a departure.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::{normalize_day, pair_bookings};
/// use worktime_engine::models::{Booking, BookingCategory, BookingDirection, DayPlanConfig};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let bookings = vec![
///     Booking::new("emp_001", date, BookingDirection::In, BookingCategory::Work, 475),
///     Booking::new("emp_001", date, BookingDirection::Out, BookingCategory::Work, 1020),
/// ];
///
/// let mut plan = DayPlanConfig::with_target("std", 480);
/// plan.expected_arrival = Some(480);
/// plan.tolerance.arrival_minus = 5;
///
/// let pairing = pair_bookings(&bookings, 1);
/// let normalized = normalize_day(&pairing.pairs, pairing.tail, pairing.head, &plan, 2);
///
/// assert_eq!(normalized.pairs[0].start, 480);
/// assert_eq!(normalized.adjustments.len(), 1);
/// assert_eq!(normalized.adjustments[0].before, 475);
/// ```
pub fn normalize_day(
    pairs: &[BookingPair],
    tail: Option<BookingRef>,
    head: Option<BookingRef>,
    plan: &DayPlanConfig,
    step_number: u32,
) -> NormalizedDay {
    let mut boundaries = Vec::new();
    for pair in pairs.iter().filter(|p| p.kind == PairKind::Work) {
        if let PairEdge::Booking(id) = pair.start_edge {
            boundaries.push(Boundary {
                booking_id: id,
                time: pair.start,
                role: Role::Arrival,
            });
        }
        if let PairEdge::Booking(id) = pair.end_edge {
            boundaries.push(Boundary {
                booking_id: id,
                time: pair.end,
                role: Role::Departure,
            });
        }
    }
    if let Some(t) = tail {
        boundaries.push(Boundary {
            booking_id: t.booking_id,
            time: t.time,
            role: Role::Arrival,
        });
    }
    if let Some(h) = head {
        boundaries.push(Boundary {
            booking_id: h.booking_id,
            time: h.time,
            role: Role::Departure,
        });
    }

    let first_arrival = boundaries
        .iter()
        .filter(|b| b.role == Role::Arrival)
        .min_by_key(|b| b.time)
        .map(|b| b.booking_id);
    let last_departure = boundaries
        .iter()
        .filter(|b| b.role == Role::Departure)
        .max_by_key(|b| b.time)
        .map(|b| b.booking_id);

    let tolerance = plan.tolerance;
    let rounding = plan.rounding;
    let mut adjusted: Vec<BookingAdjustment> = Vec::new();

    for boundary in &boundaries {
        if adjusted.iter().any(|a| a.booking_id == boundary.booking_id) {
            continue;
        }

        let after = match boundary.role {
            Role::Arrival if first_arrival == Some(boundary.booking_id) => {
                let snapped = apply_tolerance(
                    boundary.time,
                    plan.expected_arrival,
                    tolerance.arrival_plus,
                    tolerance.arrival_minus,
                );
                apply_rounding(snapped, rounding.arrival)
            }
            Role::Departure if last_departure == Some(boundary.booking_id) => {
                let snapped = apply_tolerance(
                    boundary.time,
                    plan.expected_departure,
                    tolerance.departure_plus,
                    tolerance.departure_minus,
                );
                apply_rounding(snapped, rounding.departure)
            }
            Role::Arrival if rounding.round_all_bookings => {
                apply_rounding(boundary.time, rounding.arrival)
            }
            Role::Departure if rounding.round_all_bookings => {
                apply_rounding(boundary.time, rounding.departure)
            }
            _ => boundary.time,
        };

        adjusted.push(BookingAdjustment {
            booking_id: boundary.booking_id,
            before: boundary.time,
            after,
        });
    }

    let lookup = |edge: PairEdge, time: i32| -> i32 {
        edge.booking_id()
            .and_then(|id| adjusted.iter().find(|a| a.booking_id == id))
            .map_or(time, |a| a.after)
    };

    let mut normalized_pairs: Vec<BookingPair> = pairs
        .iter()
        .map(|pair| match pair.kind {
            PairKind::Work => BookingPair {
                start: lookup(pair.start_edge, pair.start),
                end: lookup(pair.end_edge, pair.end),
                ..*pair
            },
            PairKind::Break => *pair,
        })
        .collect();
    normalized_pairs.sort_by_key(|p| (p.start, p.end));

    let remap = |r: BookingRef| BookingRef {
        booking_id: r.booking_id,
        time: lookup(PairEdge::Booking(r.booking_id), r.time),
    };
    let tail = tail.map(remap);
    let head = head.map(remap);

    adjusted.retain(|a| a.before != a.after);

    let audit_step = AuditStep {
        step_number,
        rule_id: "boundary_normalization".to_string(),
        rule_name: "Tolerance and Rounding".to_string(),
        input: serde_json::json!({
            "plan": plan.code,
            "expected_arrival": plan.expected_arrival,
            "expected_departure": plan.expected_departure,
            "round_all_bookings": rounding.round_all_bookings,
            "boundaries": boundaries.len()
        }),
        output: serde_json::json!({
            "adjustments": adjusted
                .iter()
                .map(|a| serde_json::json!({"before": a.before, "after": a.after}))
                .collect::<Vec<_>>()
        }),
        reasoning: if adjusted.is_empty() {
            "No boundary needed adjustment".to_string()
        } else {
            format!("{} boundary time(s) adjusted", adjusted.len())
        },
    };

    NormalizedDay {
        pairs: normalized_pairs,
        tail,
        head,
        adjustments: adjusted,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::pair_bookings;
    use crate::models::{Booking, BookingCategory, BookingDirection, RoundingRule};
    use chrono::NaiveDate;

    fn work(direction: BookingDirection, time: i32) -> Booking {
        Booking::new(
            "emp_001",
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            direction,
            BookingCategory::Work,
            time,
        )
    }

    fn normalize(bookings: &[Booking], plan: &DayPlanConfig) -> NormalizedDay {
        let pairing = pair_bookings(bookings, 1);
        normalize_day(&pairing.pairs, pairing.tail, pairing.head, plan, 2)
    }

    fn office_plan() -> DayPlanConfig {
        let mut plan = DayPlanConfig::with_target("std", 480);
        plan.expected_arrival = Some(480);
        plan.expected_departure = Some(1020);
        plan.tolerance.arrival_plus = 5;
        plan.tolerance.arrival_minus = 5;
        plan.tolerance.departure_plus = 5;
        plan.tolerance.departure_minus = 5;
        plan
    }

    #[test]
    fn test_tolerance_snaps_first_and_last_boundary() {
        let result = normalize(
            &[work(BookingDirection::In, 477), work(BookingDirection::Out, 1023)],
            &office_plan(),
        );
        assert_eq!((result.pairs[0].start, result.pairs[0].end), (480, 1020));
        assert_eq!(result.adjustments.len(), 2);
    }

    #[test]
    fn test_tolerance_ignores_inner_boundaries() {
        let mut plan = office_plan();
        plan.tolerance.arrival_plus = 60;
        plan.tolerance.arrival_minus = 0;
        let result = normalize(
            &[
                work(BookingDirection::In, 470),
                work(BookingDirection::Out, 490),
                work(BookingDirection::In, 500),
                work(BookingDirection::Out, 1020),
            ],
            &plan,
        );
        // 500 is within tolerance of the expected arrival but is not the
        // first arrival; 470 is the first arrival but outside tolerance.
        assert_eq!(result.pairs[0].start, 470);
        assert_eq!(result.pairs[1].start, 500);
        assert!(result.adjustments.is_empty());
    }

    #[test]
    fn test_round_all_bookings_rounds_inner_boundaries_only_by_rounding() {
        let mut plan = office_plan();
        plan.rounding.arrival = RoundingRule::Up { interval: 15 };
        plan.rounding.departure = RoundingRule::Down { interval: 15 };
        plan.rounding.round_all_bookings = true;

        let result = normalize(
            &[
                work(BookingDirection::In, 470),
                work(BookingDirection::Out, 722),
                work(BookingDirection::In, 761),
                work(BookingDirection::Out, 1030),
            ],
            &plan,
        );
        assert_eq!((result.pairs[0].start, result.pairs[0].end), (480, 720));
        assert_eq!((result.pairs[1].start, result.pairs[1].end), (765, 1020));
    }

    #[test]
    fn test_without_round_all_inner_boundaries_are_unchanged() {
        let mut plan = office_plan();
        plan.rounding.arrival = RoundingRule::Up { interval: 15 };
        plan.rounding.departure = RoundingRule::Down { interval: 15 };

        let result = normalize(
            &[
                work(BookingDirection::In, 470),
                work(BookingDirection::Out, 722),
                work(BookingDirection::In, 761),
                work(BookingDirection::Out, 1030),
            ],
            &plan,
        );
        assert_eq!((result.pairs[0].start, result.pairs[0].end), (480, 722));
        assert_eq!((result.pairs[1].start, result.pairs[1].end), (761, 1020));
    }

    #[test]
    fn test_tail_is_treated_as_arrival() {
        let mut plan = DayPlanConfig::with_target("night", 480);
        plan.expected_arrival = Some(1320);
        plan.tolerance.arrival_plus = 10;

        let result = normalize(&[work(BookingDirection::In, 1327)], &plan);
        assert_eq!(result.tail.map(|t| t.time), Some(1320));
        assert_eq!(result.adjusted_time(result.tail.map(|t| t.booking_id).unwrap()), Some(1320));
    }

    #[test]
    fn test_head_is_treated_as_departure() {
        let mut plan = DayPlanConfig::with_target("night", 480);
        plan.expected_departure = Some(360);
        plan.tolerance.departure_minus = 10;

        let result = normalize(&[work(BookingDirection::Out, 352)], &plan);
        assert_eq!(result.head.map(|h| h.time), Some(360));
    }

    #[test]
    fn test_no_rules_means_no_adjustments() {
        let result = normalize(
            &[work(BookingDirection::In, 477), work(BookingDirection::Out, 1023)],
            &DayPlanConfig::with_target("flex", 480),
        );
        assert!(result.adjustments.is_empty());
        assert_eq!(result.audit_step.rule_id, "boundary_normalization");
    }

    #[test]
    fn test_normalization_is_stable_on_its_own_output() {
        let mut plan = office_plan();
        plan.rounding.arrival = RoundingRule::Nearest { interval: 10 };
        let bookings = [work(BookingDirection::In, 484), work(BookingDirection::Out, 1019)];
        let once = normalize(&bookings, &plan);
        let twice = normalize_day(&once.pairs, once.tail, once.head, &plan, 2);
        assert_eq!(once.pairs, twice.pairs);
        assert!(twice.adjustments.is_empty());
    }
}
