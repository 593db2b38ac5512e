//! Day plan configuration.
//!
//! A [`DayPlanConfig`] is the expected schedule and rule set for one
//! employee-day. Break and rounding rules are closed enums so every variant is
//! handled exhaustively by the calculation stages.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::booking::MINUTES_PER_DAY;

/// How a boundary time is rounded.
///
/// # Example
///
/// ```
/// use worktime_engine::models::RoundingRule;
///
/// let rule: RoundingRule = serde_yaml::from_str("mode: up\ninterval: 15").unwrap();
/// assert_eq!(rule, RoundingRule::Up { interval: 15 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoundingRule {
    /// Leave the time unchanged.
    #[default]
    None,
    /// Round up to the next multiple of `interval`.
    Up {
        /// Rounding grid in minutes.
        interval: i32,
    },
    /// Round down to the previous multiple of `interval`.
    Down {
        /// Rounding grid in minutes.
        interval: i32,
    },
    /// Round to the nearest multiple of `interval`; ties round up.
    Nearest {
        /// Rounding grid in minutes.
        interval: i32,
    },
    /// Add a fixed number of minutes.
    Add {
        /// Minutes to add.
        value: i32,
    },
    /// Subtract a fixed number of minutes, flooring at 0.
    Subtract {
        /// Minutes to subtract.
        value: i32,
    },
}

/// Rounding applied to arrival and departure boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundingConfig {
    /// Rule for arrivals.
    #[serde(default)]
    pub arrival: RoundingRule,
    /// Rule for departures.
    #[serde(default)]
    pub departure: RoundingRule,
    /// Round every work boundary, not only first arrival and last departure.
    /// Tolerance is unaffected by this flag.
    #[serde(default)]
    pub round_all_bookings: bool,
}

/// Asymmetric tolerance around the expected arrival and departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Minutes an arrival may be late and still snap to the expected time.
    #[serde(default)]
    pub arrival_plus: i32,
    /// Minutes an arrival may be early and still snap to the expected time.
    #[serde(default)]
    pub arrival_minus: i32,
    /// Minutes a departure may be late and still snap to the expected time.
    #[serde(default)]
    pub departure_plus: i32,
    /// Minutes a departure may be early and still snap to the expected time.
    #[serde(default)]
    pub departure_minus: i32,
}

/// One break rule of a day plan.
///
/// Rules are applied in kind order (fixed, variable, minimum) regardless of
/// their position in the configured list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BreakRule {
    /// A break window deducted whenever work overlaps it.
    Fixed {
        /// Window start (minutes since midnight).
        start: i32,
        /// Window end (minutes since midnight).
        end: i32,
        /// Minutes to deduct at most.
        duration: i32,
        /// Paid breaks are recorded but not deducted.
        #[serde(default)]
        paid: bool,
    },
    /// A break deducted once gross time exceeds a threshold, unless a break
    /// was booked. Several variable rules form a table; the highest exceeded
    /// threshold applies.
    Variable {
        /// Gross minutes that must be exceeded.
        after_minutes: i32,
        /// Minutes to deduct.
        duration: i32,
        /// Paid breaks are recorded but not deducted.
        #[serde(default)]
        paid: bool,
    },
    /// Tops the day's break time up to a minimum once gross time exceeds a
    /// threshold.
    Minimum {
        /// Gross minutes that must be exceeded.
        #[serde(default)]
        after_minutes: i32,
        /// Minimum total break in minutes.
        minimum: i32,
        /// Paid breaks are recorded but not deducted.
        #[serde(default)]
        paid: bool,
    },
}

/// The value credited on a holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum HolidayCredit {
    /// Category 1: the plan's target time.
    #[default]
    Target,
    /// Category 2: mean net time of the trailing weeks.
    TrailingAverage,
    /// Category 3: a fixed number of minutes.
    Fixed {
        /// Minutes credited.
        minutes: i32,
    },
}

impl HolidayCredit {
    /// The numeric category (1 target, 2 trailing average, 3 fixed).
    pub fn category(&self) -> u8 {
        match self {
            HolidayCredit::Target => 1,
            HolidayCredit::TrailingAverage => 2,
            HolidayCredit::Fixed { .. } => 3,
        }
    }
}

/// How a shift crossing midnight is credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayChangePolicy {
    /// Split at midnight without further action.
    #[default]
    None,
    /// Credit the whole shift to the arrival day.
    AtArrival,
    /// Credit the whole shift to the departure day.
    AtDeparture,
    /// Split at midnight with synthetic bookings and a warning.
    AutoComplete,
}

/// The expected schedule and rules for one employee-day.
///
/// # Example
///
/// ```
/// use worktime_engine::models::{DayPlanConfig, DayChangePolicy};
///
/// let yaml = r#"
/// code: std
/// expected_arrival: 480
/// expected_departure: 1020
/// target_minutes: 480
/// breaks:
///   - type: fixed
///     start: 720
///     end: 750
///     duration: 30
/// "#;
/// let plan: DayPlanConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(plan.target_minutes, 480);
/// assert_eq!(plan.day_change, DayChangePolicy::None);
/// assert!(plan.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlanConfig {
    /// Identifier of the plan.
    pub code: String,
    /// Expected arrival, the tolerance reference.
    #[serde(default)]
    pub expected_arrival: Option<i32>,
    /// Expected departure, the tolerance reference.
    #[serde(default)]
    pub expected_departure: Option<i32>,
    /// Earliest allowed arrival; earlier arrivals are flagged.
    #[serde(default)]
    pub earliest_arrival: Option<i32>,
    /// Latest allowed departure; later departures are flagged.
    #[serde(default)]
    pub latest_departure: Option<i32>,
    /// Tolerance around the expected times.
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Rounding rules.
    #[serde(default)]
    pub rounding: RoundingConfig,
    /// Break rules.
    #[serde(default)]
    pub breaks: Vec<BreakRule>,
    /// Target (expected net) time in minutes.
    pub target_minutes: i32,
    /// Cap on net time, if any.
    #[serde(default)]
    pub max_net_minutes: Option<i32>,
    /// What a holiday credits.
    #[serde(default)]
    pub holiday_credit: HolidayCredit,
    /// How midnight-crossing shifts are credited.
    #[serde(default)]
    pub day_change: DayChangePolicy,
}

impl DayPlanConfig {
    /// Creates a plan with only a target time and every rule disabled.
    pub fn with_target(code: impl Into<String>, target_minutes: i32) -> Self {
        Self {
            code: code.into(),
            expected_arrival: None,
            expected_departure: None,
            earliest_arrival: None,
            latest_departure: None,
            tolerance: ToleranceConfig::default(),
            rounding: RoundingConfig::default(),
            breaks: Vec::new(),
            target_minutes,
            max_net_minutes: None,
            holiday_credit: HolidayCredit::default(),
            day_change: DayChangePolicy::default(),
        }
    }

    /// Checks every value the calculation depends on.
    ///
    /// Returns [`EngineError::InvalidDayPlan`] describing the first problem found.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidDayPlan {
            code: self.code.clone(),
            message,
        };

        if !(0..=MINUTES_PER_DAY).contains(&self.target_minutes) {
            return Err(invalid(format!(
                "target_minutes {} outside 0..=1440",
                self.target_minutes
            )));
        }

        let clock_fields = [
            ("expected_arrival", self.expected_arrival),
            ("expected_departure", self.expected_departure),
            ("earliest_arrival", self.earliest_arrival),
            ("latest_departure", self.latest_departure),
        ];
        for (name, value) in clock_fields {
            if let Some(minutes) = value {
                if !(0..=MINUTES_PER_DAY).contains(&minutes) {
                    return Err(invalid(format!("{} {} outside 0..=1440", name, minutes)));
                }
            }
        }

        let t = &self.tolerance;
        if t.arrival_plus < 0 || t.arrival_minus < 0 || t.departure_plus < 0 || t.departure_minus < 0
        {
            return Err(invalid("tolerance values must not be negative".to_string()));
        }

        for rule in [self.rounding.arrival, self.rounding.departure] {
            match rule {
                RoundingRule::None => {}
                RoundingRule::Up { interval }
                | RoundingRule::Down { interval }
                | RoundingRule::Nearest { interval } => {
                    if !(1..=MINUTES_PER_DAY).contains(&interval) {
                        return Err(invalid(format!(
                            "rounding interval must be in 1..=1440, got {}",
                            interval
                        )));
                    }
                }
                RoundingRule::Add { value } | RoundingRule::Subtract { value } => {
                    if !(0..=MINUTES_PER_DAY).contains(&value) {
                        return Err(invalid(format!(
                            "rounding value must be in 0..=1440, got {}",
                            value
                        )));
                    }
                }
            }
        }

        for rule in &self.breaks {
            match *rule {
                BreakRule::Fixed {
                    start,
                    end,
                    duration,
                    ..
                } => {
                    if start < 0 || end > MINUTES_PER_DAY || start >= end {
                        return Err(invalid(format!(
                            "fixed break window {}..{} is not a valid window",
                            start, end
                        )));
                    }
                    if !(0..=MINUTES_PER_DAY).contains(&duration) {
                        return Err(invalid(format!(
                            "fixed break duration {} outside 0..=1440",
                            duration
                        )));
                    }
                }
                BreakRule::Variable {
                    after_minutes,
                    duration,
                    ..
                } => {
                    let in_day = |v: i32| (0..=MINUTES_PER_DAY).contains(&v);
                    if !in_day(after_minutes) || !in_day(duration) {
                        return Err(invalid(
                            "variable break threshold and duration must be in 0..=1440".into(),
                        ));
                    }
                }
                BreakRule::Minimum {
                    after_minutes,
                    minimum,
                    ..
                } => {
                    let in_day = |v: i32| (0..=MINUTES_PER_DAY).contains(&v);
                    if !in_day(after_minutes) || !in_day(minimum) {
                        return Err(invalid(
                            "minimum break threshold and minimum must be in 0..=1440".into(),
                        ));
                    }
                }
            }
        }

        if let Some(max_net) = self.max_net_minutes {
            if max_net < 0 {
                return Err(invalid("max_net_minutes must not be negative".into()));
            }
        }

        if let HolidayCredit::Fixed { minutes } = self.holiday_credit {
            if !(0..=MINUTES_PER_DAY).contains(&minutes) {
                return Err(invalid(format!(
                    "holiday credit {} outside 0..=1440",
                    minutes
                )));
            }
        }

        Ok(())
    }
}
