//! Error and warning codes produced by the calculation stages.
//!
//! Every stage returns its own [`CalculationNotes`]; the orchestrator merges
//! them into the final value. Sets are ordered so serialized values are
//! stable across runs.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Anomalies that make a day's figures unreliable and need human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A departure without a matching arrival.
    MissingCome,
    /// An arrival without a matching departure.
    MissingGo,
    /// A new arrival before the previous interval was closed.
    OverlappingBookings,
    /// More work credited than the day has minutes.
    ExceededMaxTime,
    /// First arrival before the plan's earliest allowed arrival.
    CameBeforeAllowed,
    /// Last departure after the plan's latest allowed departure.
    LeftAfterAllowed,
}

/// Rules that fired as designed; kept for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Net time was clamped to the plan's maximum.
    MaxNetTimeExceeded,
    /// A midnight-crossing shift was split with synthetic bookings.
    DayChangeAutoComplete,
    /// Not enough history for the trailing average; target was credited.
    InsufficientDataForAverage,
    /// The monthly cap truncated the flextime change.
    MonthlyCapReached,
    /// Positive flextime change did not exceed the threshold.
    BelowThreshold,
    /// Flextime was reset because the policy carries nothing over.
    NoCarryover,
    /// The flextime balance was clamped to a positive or negative cap.
    FlextimeCapped,
    /// The year-end balance was raised to the annual floor.
    AnnualFloorApplied,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::MissingCome => "MISSING_COME",
            ErrorCode::MissingGo => "MISSING_GO",
            ErrorCode::OverlappingBookings => "OVERLAPPING_BOOKINGS",
            ErrorCode::ExceededMaxTime => "EXCEEDED_MAX_TIME",
            ErrorCode::CameBeforeAllowed => "CAME_BEFORE_ALLOWED",
            ErrorCode::LeftAfterAllowed => "LEFT_AFTER_ALLOWED",
        };
        write!(f, "{}", code)
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            WarningCode::MaxNetTimeExceeded => "MAX_NET_TIME_EXCEEDED",
            WarningCode::DayChangeAutoComplete => "DAY_CHANGE_AUTO_COMPLETE",
            WarningCode::InsufficientDataForAverage => "INSUFFICIENT_DATA_FOR_AVERAGE",
            WarningCode::MonthlyCapReached => "MONTHLY_CAP_REACHED",
            WarningCode::BelowThreshold => "BELOW_THRESHOLD",
            WarningCode::NoCarryover => "NO_CARRYOVER",
            WarningCode::FlextimeCapped => "FLEXTIME_CAPPED",
            WarningCode::AnnualFloorApplied => "ANNUAL_FLOOR_APPLIED",
        };
        write!(f, "{}", code)
    }
}

/// The errors and warnings one stage contributes.
///
/// # Example
///
/// ```
/// use worktime_engine::models::{CalculationNotes, ErrorCode, WarningCode};
///
/// let pairing = CalculationNotes::default().with_error(ErrorCode::MissingGo);
/// let totals = CalculationNotes::default().with_warning(WarningCode::MaxNetTimeExceeded);
///
/// let merged = pairing.merge(totals);
/// assert!(merged.has_errors());
/// assert!(merged.warnings.contains(&WarningCode::MaxNetTimeExceeded));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationNotes {
    /// Error codes.
    pub errors: BTreeSet<ErrorCode>,
    /// Warning codes.
    pub warnings: BTreeSet<WarningCode>,
}

impl CalculationNotes {
    /// Returns the notes with `code` added to the errors.
    pub fn with_error(mut self, code: ErrorCode) -> Self {
        self.errors.insert(code);
        self
    }

    /// Returns the notes with `code` added to the warnings.
    pub fn with_warning(mut self, code: WarningCode) -> Self {
        self.warnings.insert(code);
        self
    }

    /// Returns the union of both note sets.
    pub fn merge(mut self, other: CalculationNotes) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }

    /// Returns true if any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

impl FromIterator<CalculationNotes> for CalculationNotes {
    fn from_iter<I: IntoIterator<Item = CalculationNotes>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CalculationNotes::default(), CalculationNotes::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::OverlappingBookings).unwrap(),
            "\"OVERLAPPING_BOOKINGS\""
        );
        assert_eq!(
            serde_json::to_string(&WarningCode::InsufficientDataForAverage).unwrap(),
            "\"INSUFFICIENT_DATA_FOR_AVERAGE\""
        );
    }

    #[test]
    fn test_display_matches_serialized_form() {
        for code in [ErrorCode::MissingCome, ErrorCode::LeftAfterAllowed] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code));
        }
        for code in [WarningCode::NoCarryover, WarningCode::DayChangeAutoComplete] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code));
        }
    }

    #[test]
    fn test_merge_is_a_union() {
        let a = CalculationNotes::default()
            .with_error(ErrorCode::MissingGo)
            .with_warning(WarningCode::DayChangeAutoComplete);
        let b = CalculationNotes::default()
            .with_error(ErrorCode::MissingGo)
            .with_error(ErrorCode::MissingCome);

        let merged = a.merge(b);
        assert_eq!(merged.errors.len(), 2);
        assert_eq!(merged.warnings.len(), 1);
    }

    #[test]
    fn test_collect_merges_all() {
        let merged: CalculationNotes = vec![
            CalculationNotes::default().with_warning(WarningCode::BelowThreshold),
            CalculationNotes::default(),
            CalculationNotes::default().with_error(ErrorCode::ExceededMaxTime),
        ]
        .into_iter()
        .collect();

        assert!(merged.has_errors());
        assert!(merged.warnings.contains(&WarningCode::BelowThreshold));
    }

    #[test]
    fn test_default_is_empty() {
        assert!(CalculationNotes::default().is_empty());
    }
}
