//! Booking pairing.
//!
//! Groups a day's raw bookings into ordered work and break intervals. Open
//! ends that may belong to a shift crossing midnight are handed to the
//! day-change resolver instead of being reported as errors here.

use serde::{Deserialize, Serialize};

use crate::models::{
    AuditStep, Booking, BookingCategory, BookingDirection, BookingPair, BookingRef,
    CalculationNotes, ErrorCode, PairKind,
};

/// A booking that could not be paired and cannot cross midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedBooking {
    /// The booking.
    pub booking: BookingRef,
    /// Its direction.
    pub direction: BookingDirection,
    /// Its category.
    pub category: BookingCategory,
}

/// The outcome of pairing one day's bookings.
#[derive(Debug, Clone)]
pub struct PairingResult {
    /// Closed work and break pairs, ordered by start time.
    pub pairs: Vec<BookingPair>,
    /// A work arrival left open at the end of the day.
    pub tail: Option<BookingRef>,
    /// A work departure before the day's first work arrival.
    pub head: Option<BookingRef>,
    /// Bookings that could not be paired at all.
    pub unmatched: Vec<UnmatchedBooking>,
    /// Number of pairs truncated by a later arrival.
    pub overlap_count: u32,
    /// Errors found while pairing.
    pub notes: CalculationNotes,
    /// The audit step recording the pairing.
    pub audit_step: AuditStep,
}

#[derive(Default)]
struct OpenArrivals {
    work: Option<BookingRef>,
    break_: Option<BookingRef>,
}

impl OpenArrivals {
    fn slot(&mut self, category: BookingCategory) -> &mut Option<BookingRef> {
        match category {
            BookingCategory::Work => &mut self.work,
            BookingCategory::Break => &mut self.break_,
        }
    }
}

/// Pairs a day's bookings into work and break intervals.
///
/// Bookings are ordered by their effective (calculated, else edited) time;
/// the sort is stable, so ties keep the order the store returned them in.
///
/// - An `out` closes the open `in` of the same category.
/// - A second `in` while one is open truncates the earlier pair at the new
///   arrival and records `OVERLAPPING_BOOKINGS`; the later booking stays open.
/// - A work `in` still open at the end of the day becomes the `tail`.
/// - A work `out` before any work `in` becomes the `head`.
/// - Any other unmatched booking is reported (`MISSING_COME` for departures,
///   `MISSING_GO` for arrivals).
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::pair_bookings;
/// use worktime_engine::models::{Booking, BookingCategory, BookingDirection};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let bookings = vec![
///     Booking::new("emp_001", date, BookingDirection::In, BookingCategory::Work, 480),
///     Booking::new("emp_001", date, BookingDirection::Out, BookingCategory::Work, 1020),
/// ];
///
/// let result = pair_bookings(&bookings, 1);
/// assert_eq!(result.pairs.len(), 1);
/// assert_eq!(result.pairs[0].duration(), 540);
/// assert!(result.tail.is_none());
/// assert!(result.notes.is_empty());
/// ```
pub fn pair_bookings(bookings: &[Booking], step_number: u32) -> PairingResult {
    let mut ordered: Vec<&Booking> = bookings.iter().collect();
    ordered.sort_by_key(|b| b.effective_time());

    let mut open = OpenArrivals::default();
    let mut pairs = Vec::new();
    let mut head = None;
    let mut unmatched = Vec::new();
    let mut overlap_count = 0;
    let mut seen_work_arrival = false;

    for booking in ordered {
        let current = BookingRef::from(booking);
        let kind = PairKind::from(booking.category);

        match booking.direction {
            BookingDirection::In => {
                if let Some(previous) = open.slot(booking.category).replace(current) {
                    overlap_count += 1;
                    pairs.push(BookingPair::between(kind, &previous, &current));
                }
                if booking.category == BookingCategory::Work {
                    seen_work_arrival = true;
                }
            }
            BookingDirection::Out => match open.slot(booking.category).take() {
                Some(start) => pairs.push(BookingPair::between(kind, &start, &current)),
                None => {
                    let is_head = booking.category == BookingCategory::Work
                        && !seen_work_arrival
                        && head.is_none();
                    if is_head {
                        head = Some(current);
                    } else {
                        unmatched.push(UnmatchedBooking {
                            booking: current,
                            direction: booking.direction,
                            category: booking.category,
                        });
                    }
                }
            },
        }
    }

    let tail = open.work.take();
    if let Some(open_break) = open.break_.take() {
        unmatched.push(UnmatchedBooking {
            booking: open_break,
            direction: BookingDirection::In,
            category: BookingCategory::Break,
        });
    }

    pairs.sort_by_key(|p| (p.start, p.end));

    let mut notes = CalculationNotes::default();
    if overlap_count > 0 {
        notes = notes.with_error(ErrorCode::OverlappingBookings);
    }
    for stray in &unmatched {
        notes = notes.with_error(match stray.direction {
            BookingDirection::In => ErrorCode::MissingGo,
            BookingDirection::Out => ErrorCode::MissingCome,
        });
    }

    let work_pairs = pairs.iter().filter(|p| p.kind == PairKind::Work).count();
    let break_pairs = pairs.len() - work_pairs;

    let audit_step = AuditStep {
        step_number,
        rule_id: "booking_pairing".to_string(),
        rule_name: "Booking Pairing".to_string(),
        input: serde_json::json!({
            "booking_count": bookings.len()
        }),
        output: serde_json::json!({
            "work_pairs": work_pairs,
            "break_pairs": break_pairs,
            "open_tail": tail.map(|t| t.time),
            "open_head": head.map(|h| h.time),
            "unmatched": unmatched.len(),
            "overlaps": overlap_count
        }),
        reasoning: format!(
            "{} booking(s) formed {} work pair(s) and {} break pair(s); {} unmatched, {} overlap(s)",
            bookings.len(),
            work_pairs,
            break_pairs,
            unmatched.len(),
            overlap_count
        ),
    };

    PairingResult {
        pairs,
        tail,
        head,
        unmatched,
        overlap_count,
        notes,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn work(direction: BookingDirection, time: i32) -> Booking {
        Booking::new("emp_001", date(), direction, BookingCategory::Work, time)
    }

    fn brk(direction: BookingDirection, time: i32) -> Booking {
        Booking::new("emp_001", date(), direction, BookingCategory::Break, time)
    }

    use BookingDirection::{In, Out};

    #[test]
    fn test_simple_day_forms_one_pair() {
        let result = pair_bookings(&[work(In, 480), work(Out, 1020)], 1);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].start, 480);
        assert_eq!(result.pairs[0].end, 1020);
        assert_eq!(result.pairs[0].kind, PairKind::Work);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_unordered_input_is_sorted_by_time() {
        let result = pair_bookings(
            &[work(Out, 720), work(In, 780), work(In, 480), work(Out, 1020)],
            1,
        );
        assert_eq!(result.pairs.len(), 2);
        assert_eq!((result.pairs[0].start, result.pairs[0].end), (480, 720));
        assert_eq!((result.pairs[1].start, result.pairs[1].end), (780, 1020));
        assert!(result.head.is_none());
    }

    #[test]
    fn test_break_pairs_are_tracked_separately() {
        let result = pair_bookings(
            &[
                work(In, 480),
                brk(In, 720),
                brk(Out, 750),
                work(Out, 1020),
            ],
            1,
        );
        assert_eq!(result.pairs.len(), 2);
        let breaks: Vec<_> = result
            .pairs
            .iter()
            .filter(|p| p.kind == PairKind::Break)
            .collect();
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].duration(), 30);
    }

    #[test]
    fn test_open_arrival_becomes_tail() {
        let result = pair_bookings(&[work(In, 1320)], 1);
        assert!(result.pairs.is_empty());
        assert_eq!(result.tail.map(|t| t.time), Some(1320));
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_leading_departure_becomes_head() {
        let result = pair_bookings(&[work(Out, 360), work(In, 1320)], 1);
        assert_eq!(result.head.map(|h| h.time), Some(360));
        assert_eq!(result.tail.map(|t| t.time), Some(1320));
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn test_stray_departure_is_missing_come() {
        let result = pair_bookings(
            &[work(In, 480), work(Out, 720), work(Out, 1020)],
            1,
        );
        assert_eq!(result.pairs.len(), 1);
        assert!(result.head.is_none());
        assert_eq!(result.unmatched.len(), 1);
        assert!(result.notes.errors.contains(&ErrorCode::MissingCome));
    }

    #[test]
    fn test_second_arrival_truncates_earlier_pair() {
        let result = pair_bookings(&[work(In, 480), work(In, 540), work(Out, 1020)], 1);
        assert_eq!(result.overlap_count, 1);
        assert!(result.notes.errors.contains(&ErrorCode::OverlappingBookings));
        assert_eq!(result.pairs.len(), 2);
        assert_eq!((result.pairs[0].start, result.pairs[0].end), (480, 540));
        assert_eq!((result.pairs[1].start, result.pairs[1].end), (540, 1020));
    }

    #[test]
    fn test_open_break_is_missing_go() {
        let result = pair_bookings(&[work(In, 480), brk(In, 720), work(Out, 1020)], 1);
        assert!(result.notes.errors.contains(&ErrorCode::MissingGo));
        assert!(result.tail.is_none());
    }

    #[test]
    fn test_ties_keep_input_order() {
        // An arrival and a departure at the same minute: the input order decides.
        let arrival = work(In, 480);
        let departure = work(Out, 480);
        let result = pair_bookings(&[arrival.clone(), departure.clone()], 1);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].duration(), 0);

        let reversed = pair_bookings(&[departure, arrival], 1);
        assert!(reversed.pairs.is_empty());
        assert!(reversed.head.is_some());
        assert!(reversed.tail.is_some());
    }

    #[test]
    fn test_calculated_time_drives_ordering() {
        let mut late_in = work(In, 700);
        late_in.calculated_time = Some(470);
        let result = pair_bookings(&[work(Out, 600), late_in], 1);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].start, 470);
    }

    #[test]
    fn test_audit_step_counts() {
        let result = pair_bookings(&[work(In, 480), work(Out, 1020)], 3);
        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.rule_id, "booking_pairing");
        assert_eq!(result.audit_step.output["work_pairs"], 1);
        assert_eq!(result.audit_step.input["booking_count"], 2);
    }

    #[test]
    fn test_empty_day() {
        let result = pair_bookings(&[], 1);
        assert!(result.pairs.is_empty());
        assert!(result.tail.is_none());
        assert!(result.head.is_none());
        assert!(result.notes.is_empty());
    }
}
