//! Tolerance snapping.

/// Snaps `actual` to `expected` when it lies within the tolerance window.
///
/// A time up to `plus` minutes after the expected time (inclusive) or up to
/// `minus` minutes before it snaps to the expected time; anything else is
/// returned unchanged. Without an expected time this is a no-op.
///
/// # Examples
///
/// ```
/// use worktime_engine::calculation::apply_tolerance;
///
/// assert_eq!(apply_tolerance(475, Some(480), 5, 5), 480);
/// assert_eq!(apply_tolerance(474, Some(480), 5, 5), 474);
/// assert_eq!(apply_tolerance(485, Some(480), 5, 5), 480);
/// assert_eq!(apply_tolerance(486, Some(480), 5, 5), 486);
/// assert_eq!(apply_tolerance(475, None, 5, 5), 475);
/// ```
pub fn apply_tolerance(actual: i32, expected: Option<i32>, plus: i32, minus: i32) -> i32 {
    let Some(expected) = expected else {
        return actual;
    };

    let diff = actual - expected;
    let late_within = (0..=plus).contains(&diff);
    let early_within = (-minus..0).contains(&diff);

    if late_within || early_within {
        expected
    } else {
        actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_within_tolerance_snaps() {
        assert_eq!(apply_tolerance(475, Some(480), 5, 5), 480);
    }

    #[test]
    fn test_just_outside_early_tolerance_is_unchanged() {
        assert_eq!(apply_tolerance(474, Some(480), 5, 5), 474);
    }

    #[test]
    fn test_late_within_tolerance_snaps() {
        assert_eq!(apply_tolerance(483, Some(480), 5, 0), 480);
    }

    #[test]
    fn test_exact_time_is_unchanged() {
        assert_eq!(apply_tolerance(480, Some(480), 0, 0), 480);
    }

    #[test]
    fn test_asymmetric_tolerance() {
        // 10 minutes late allowed, no early tolerance
        assert_eq!(apply_tolerance(490, Some(480), 10, 0), 480);
        assert_eq!(apply_tolerance(479, Some(480), 10, 0), 479);
    }

    #[test]
    fn test_zero_tolerance_is_noop_for_other_times() {
        assert_eq!(apply_tolerance(481, Some(480), 0, 0), 481);
        assert_eq!(apply_tolerance(479, Some(480), 0, 0), 479);
    }

    #[test]
    fn test_missing_expected_time_is_noop() {
        assert_eq!(apply_tolerance(123, None, 60, 60), 123);
    }
}
