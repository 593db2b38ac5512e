//! Booking and booking pair models.
//!
//! A [`Booking`] is one raw time-clock event. A [`BookingPair`] is the
//! ephemeral interval built from two bookings (or from one booking and a
//! synthetic boundary) during a single calculation run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of minutes in a calendar day. Also the end-of-day boundary used
/// for intervals that are counted "to midnight".
pub const MINUTES_PER_DAY: i32 = 1440;

/// Whether a booking opens or closes an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingDirection {
    /// Arrival / start of an interval.
    In,
    /// Departure / end of an interval.
    Out,
}

/// What kind of interval a booking belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingCategory {
    /// Work time.
    Work,
    /// A manually booked break.
    Break,
}

/// One raw time-clock event.
///
/// All times are minutes since midnight of `date`. `edited_time` carries
/// manual corrections; `calculated_time` is written by the engine after
/// tolerance and rounding and is never set by upstream intake.
///
/// # Example
///
/// ```
/// use worktime_engine::models::{Booking, BookingCategory, BookingDirection};
/// use chrono::NaiveDate;
///
/// let booking = Booking::new(
///     "emp_001",
///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///     BookingDirection::In,
///     BookingCategory::Work,
///     478,
/// );
/// assert_eq!(booking.edited_time, 478);
/// assert_eq!(booking.effective_time(), 478);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier of the booking.
    pub id: Uuid,
    /// The employee who booked.
    pub employee_id: String,
    /// The calendar date owning the booking.
    pub date: NaiveDate,
    /// Arrival or departure.
    pub direction: BookingDirection,
    /// Work or break.
    pub category: BookingCategory,
    /// The time as captured by the terminal.
    pub original_time: i32,
    /// The time after manual correction (equals `original_time` if uncorrected).
    pub edited_time: i32,
    /// The time after tolerance and rounding, written by the engine.
    #[serde(default)]
    pub calculated_time: Option<i32>,
}

impl Booking {
    /// Creates an uncorrected booking with a fresh id.
    pub fn new(
        employee_id: impl Into<String>,
        date: NaiveDate,
        direction: BookingDirection,
        category: BookingCategory,
        time: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            date,
            direction,
            category,
            original_time: time,
            edited_time: time,
            calculated_time: None,
        }
    }

    /// The time the calculation works with: the calculated time if one has
    /// been written, otherwise the edited time.
    pub fn effective_time(&self) -> i32 {
        self.calculated_time.unwrap_or(self.edited_time)
    }
}

/// The kind of a [`BookingPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// A work interval.
    Work,
    /// A booked break interval.
    Break,
}

impl From<BookingCategory> for PairKind {
    fn from(category: BookingCategory) -> Self {
        match category {
            BookingCategory::Work => PairKind::Work,
            BookingCategory::Break => PairKind::Break,
        }
    }
}

/// Where one edge of a pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "booking_id")]
pub enum PairEdge {
    /// A real booking.
    Booking(Uuid),
    /// A boundary created by the engine (midnight split, day-change credit).
    Synthetic,
}

impl PairEdge {
    /// Returns the booking id if the edge is backed by a real booking.
    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            PairEdge::Booking(id) => Some(*id),
            PairEdge::Synthetic => None,
        }
    }
}

/// A time interval derived from bookings during one calculation run.
///
/// `start` and `end` are minutes relative to midnight of the day the pair is
/// credited to; day-change crediting may push them below 0 or above 1440.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPair {
    /// Work or break.
    pub kind: PairKind,
    /// Start of the interval.
    pub start: i32,
    /// End of the interval.
    pub end: i32,
    /// Provenance of the start boundary.
    pub start_edge: PairEdge,
    /// Provenance of the end boundary.
    pub end_edge: PairEdge,
}

impl BookingPair {
    /// Creates a pair between two real bookings.
    pub fn between(kind: PairKind, start: &BookingRef, end: &BookingRef) -> Self {
        Self {
            kind,
            start: start.time,
            end: end.time,
            start_edge: PairEdge::Booking(start.booking_id),
            end_edge: PairEdge::Booking(end.booking_id),
        }
    }

    /// Duration in minutes, never negative.
    ///
    /// ```
    /// use worktime_engine::models::{BookingPair, PairEdge, PairKind};
    ///
    /// let pair = BookingPair {
    ///     kind: PairKind::Work,
    ///     start: 480,
    ///     end: 1020,
    ///     start_edge: PairEdge::Synthetic,
    ///     end_edge: PairEdge::Synthetic,
    /// };
    /// assert_eq!(pair.duration(), 540);
    /// ```
    pub fn duration(&self) -> i32 {
        (self.end - self.start).max(0)
    }

    /// Minutes this pair shares with the window `[from, to)`.
    pub fn overlap_with(&self, from: i32, to: i32) -> i32 {
        (self.end.min(to) - self.start.max(from)).max(0)
    }
}

/// A lightweight reference to a real booking and its working time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRef {
    /// The booking id.
    pub booking_id: Uuid,
    /// The time used by the calculation.
    pub time: i32,
}

impl From<&Booking> for BookingRef {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            time: booking.effective_time(),
        }
    }
}
