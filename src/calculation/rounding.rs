//! Boundary rounding.

use crate::models::RoundingRule;

/// Applies a rounding rule to a time.
///
/// - `Up`/`Down`/`Nearest` round to a multiple of the interval; `Nearest`
///   rounds ties up. A non-positive interval leaves the time unchanged
///   (plans with such intervals are rejected by validation).
/// - `Add` adds a fixed value; `Subtract` subtracts it and floors at 0.
///
/// # Examples
///
/// ```
/// use worktime_engine::calculation::apply_rounding;
/// use worktime_engine::models::RoundingRule;
///
/// assert_eq!(apply_rounding(487, RoundingRule::Up { interval: 15 }), 495);
/// assert_eq!(apply_rounding(487, RoundingRule::Down { interval: 15 }), 480);
/// assert_eq!(apply_rounding(487, RoundingRule::Nearest { interval: 15 }), 480);
/// assert_eq!(apply_rounding(10, RoundingRule::Subtract { value: 15 }), 0);
/// ```
pub fn apply_rounding(time: i32, rule: RoundingRule) -> i32 {
    match rule {
        RoundingRule::None => time,
        RoundingRule::Up { interval } => round_up(time, interval),
        RoundingRule::Down { interval } => round_down(time, interval),
        RoundingRule::Nearest { interval } => {
            if interval <= 0 {
                return time;
            }
            if time.rem_euclid(interval) * 2 >= interval {
                round_up(time, interval)
            } else {
                round_down(time, interval)
            }
        }
        RoundingRule::Add { value } => time.saturating_add(value),
        RoundingRule::Subtract { value } => time.saturating_sub(value).max(0),
    }
}

fn round_down(time: i32, interval: i32) -> i32 {
    if interval <= 0 {
        return time;
    }
    time - time.rem_euclid(interval)
}

fn round_up(time: i32, interval: i32) -> i32 {
    if interval <= 0 {
        return time;
    }
    let remainder = time.rem_euclid(interval);
    if remainder == 0 {
        time
    } else {
        time - remainder + interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_noop() {
        assert_eq!(apply_rounding(487, RoundingRule::None), 487);
    }

    #[test]
    fn test_up_on_grid_is_unchanged() {
        assert_eq!(apply_rounding(480, RoundingRule::Up { interval: 15 }), 480);
    }

    #[test]
    fn test_up_moves_to_next_multiple() {
        assert_eq!(apply_rounding(481, RoundingRule::Up { interval: 15 }), 495);
    }

    #[test]
    fn test_down_moves_to_previous_multiple() {
        assert_eq!(apply_rounding(494, RoundingRule::Down { interval: 15 }), 480);
    }

    #[test]
    fn test_nearest_tie_rounds_up() {
        // 485 is exactly halfway between 480 and 490
        assert_eq!(apply_rounding(485, RoundingRule::Nearest { interval: 10 }), 490);
    }

    #[test]
    fn test_nearest_below_half_rounds_down() {
        assert_eq!(apply_rounding(484, RoundingRule::Nearest { interval: 10 }), 480);
    }

    #[test]
    fn test_nearest_odd_interval() {
        // interval 5: 482 -> remainder 2 -> down, 483 -> remainder 3 -> up
        assert_eq!(apply_rounding(482, RoundingRule::Nearest { interval: 5 }), 480);
        assert_eq!(apply_rounding(483, RoundingRule::Nearest { interval: 5 }), 485);
    }

    #[test]
    fn test_add_and_subtract() {
        assert_eq!(apply_rounding(480, RoundingRule::Add { value: 5 }), 485);
        assert_eq!(apply_rounding(480, RoundingRule::Subtract { value: 5 }), 475);
    }

    #[test]
    fn test_subtract_floors_at_zero() {
        assert_eq!(apply_rounding(3, RoundingRule::Subtract { value: 10 }), 0);
    }

    #[test]
    fn test_add_saturates_instead_of_overflowing() {
        assert_eq!(apply_rounding(480, RoundingRule::Add { value: i32::MAX }), i32::MAX);
    }

    #[test]
    fn test_non_positive_interval_is_noop() {
        assert_eq!(apply_rounding(487, RoundingRule::Up { interval: 0 }), 487);
        assert_eq!(apply_rounding(487, RoundingRule::Nearest { interval: -5 }), 487);
    }

    #[test]
    fn test_negative_time_rounds_on_same_grid() {
        // Day-change crediting may produce times before midnight of the credited day.
        assert_eq!(apply_rounding(-7, RoundingRule::Down { interval: 15 }), -15);
        assert_eq!(apply_rounding(-7, RoundingRule::Up { interval: 15 }), 0);
    }
}
