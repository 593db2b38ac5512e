//! Absence model.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// The kind of an absence day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    /// Paid vacation.
    Vacation,
    /// Sick leave.
    Sickness,
    /// Other paid leave (training, special leave).
    Special,
    /// Unpaid leave; credits no time.
    Unpaid,
}

impl AbsenceKind {
    /// Returns true if the absence credits the plan's target time.
    pub fn credits_target(&self) -> bool {
        !matches!(self, AbsenceKind::Unpaid)
    }
}

/// An absence recorded for one employee-day.
///
/// `portion` is the share of the day covered, e.g. `0.5` for a half day.
///
/// # Example
///
/// ```
/// use worktime_engine::models::{Absence, AbsenceKind};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let half_day = Absence {
///     date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
///     kind: AbsenceKind::Vacation,
///     portion: Decimal::new(5, 1),
/// };
/// assert_eq!(half_day.credited_minutes(480), 240);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    /// The absent day.
    pub date: NaiveDate,
    /// The kind of absence.
    pub kind: AbsenceKind,
    /// Share of the day covered (0 < portion <= 1).
    #[serde(default = "full_day")]
    pub portion: Decimal,
}

fn full_day() -> Decimal {
    Decimal::ONE
}

impl Absence {
    /// Minutes of `target_minutes` credited by this absence, rounded half
    /// away from zero to whole minutes.
    pub fn credited_minutes(&self, target_minutes: i32) -> i32 {
        if !self.kind.credits_target() {
            return 0;
        }
        let portion = self.portion.clamp(Decimal::ZERO, Decimal::ONE);
        let credited = (Decimal::from(target_minutes) * portion)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        credited.to_i32().unwrap_or(target_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn absence(kind: AbsenceKind, portion: &str) -> Absence {
        Absence {
            date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            kind,
            portion: Decimal::from_str(portion).unwrap(),
        }
    }

    #[test]
    fn test_full_day_vacation_credits_target() {
        assert_eq!(absence(AbsenceKind::Vacation, "1").credited_minutes(480), 480);
    }

    #[test]
    fn test_unpaid_credits_nothing() {
        assert_eq!(absence(AbsenceKind::Unpaid, "1").credited_minutes(480), 0);
    }

    #[test]
    fn test_fractional_portion_rounds_to_minutes() {
        // 455 * 0.5 = 227.5 -> 228
        assert_eq!(absence(AbsenceKind::Sickness, "0.5").credited_minutes(455), 228);
    }

    #[test]
    fn test_portion_defaults_to_full_day() {
        let json = r#"{"date": "2026-03-06", "kind": "sickness"}"#;
        let parsed: Absence = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.portion, Decimal::ONE);
    }
}
