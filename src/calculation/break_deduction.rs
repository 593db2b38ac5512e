//! Break deduction.
//!
//! Determines how many minutes of break are deducted from a day's gross
//! time. Booked breaks count first; the plan's rules are then applied by
//! kind: fixed windows, the variable threshold table, and the minimum
//! top-up.

use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, BookingPair, BreakDetail, BreakKind, BreakRule, PairKind};

/// The result of applying break rules to one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakDeduction {
    /// Every applied deduction, in application order.
    pub details: Vec<BreakDetail>,
    /// Total minutes deducted, never more than the gross time.
    pub total_minutes: i32,
    /// The audit step recording the deduction.
    pub audit_step: AuditStep,
}

/// Applies the plan's break rules to a day's credited pairs.
///
/// # Arguments
///
/// * `pairs` - Work and break pairs credited to the day
/// * `rules` - The day plan's break rules
/// * `step_number` - The step number for audit trail sequencing
///
/// # Rules
///
/// 1. Booked break pairs are deducted in full.
/// 2. **Fixed**: for each window that overlaps a work pair, the first
///    overlapping pair contributes `min(duration, overlap)`.
/// 3. **Variable**: only if no break was booked. Of all variable rules whose
///    threshold is strictly exceeded by gross time, the one with the highest
///    threshold applies.
/// 4. **Minimum**: if gross time exceeds the threshold and the break so far
///    is below the minimum, the difference is added.
///
/// Paid rules are recorded with zero minutes. The total never exceeds the
/// gross time.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::deduct_breaks;
/// use worktime_engine::models::{BookingPair, BreakRule, PairEdge, PairKind};
///
/// let pairs = vec![BookingPair {
///     kind: PairKind::Work,
///     start: 480,
///     end: 1020,
///     start_edge: PairEdge::Synthetic,
///     end_edge: PairEdge::Synthetic,
/// }];
/// let rules = vec![BreakRule::Fixed { start: 720, end: 750, duration: 30, paid: false }];
///
/// let result = deduct_breaks(&pairs, &rules, 1);
/// assert_eq!(result.total_minutes, 30);
/// ```
pub fn deduct_breaks(pairs: &[BookingPair], rules: &[BreakRule], step_number: u32) -> BreakDeduction {
    let work_pairs: Vec<&BookingPair> = pairs.iter().filter(|p| p.kind == PairKind::Work).collect();
    let gross: i32 = work_pairs.iter().map(|p| p.duration()).sum();
    let booked: i32 = pairs
        .iter()
        .filter(|p| p.kind == PairKind::Break)
        .map(|p| p.duration())
        .sum();

    let mut details = Vec::new();
    let mut total = 0;

    if booked > 0 {
        total += booked;
        details.push(BreakDetail {
            kind: BreakKind::Booked,
            minutes: booked,
            reason: format!("{} minute(s) of booked break", booked),
        });
    }

    for rule in rules {
        if let BreakRule::Fixed {
            start,
            end,
            duration,
            paid,
        } = *rule
        {
            let overlap = work_pairs
                .iter()
                .map(|p| p.overlap_with(start, end))
                .find(|&overlap| overlap > 0);
            if let Some(overlap) = overlap {
                let minutes = duration.min(overlap);
                let deducted = if paid { 0 } else { minutes };
                total += deducted;
                details.push(BreakDetail {
                    kind: BreakKind::Fixed,
                    minutes: deducted,
                    reason: format!(
                        "Fixed break {}-{}: {} minute(s) of work overlap{}",
                        start,
                        end,
                        overlap,
                        if paid { ", paid" } else { "" }
                    ),
                });
            }
        }
    }

    if booked == 0 {
        let variable = rules
            .iter()
            .filter_map(|rule| match *rule {
                BreakRule::Variable {
                    after_minutes,
                    duration,
                    paid,
                } if gross > after_minutes => Some((after_minutes, duration, paid)),
                _ => None,
            })
            .max_by_key(|&(after_minutes, _, _)| after_minutes);

        if let Some((after_minutes, duration, paid)) = variable {
            let deducted = if paid { 0 } else { duration };
            total += deducted;
            details.push(BreakDetail {
                kind: BreakKind::Variable,
                minutes: deducted,
                reason: format!(
                    "Gross time {} exceeds {} minute(s){}",
                    gross,
                    after_minutes,
                    if paid { ", paid" } else { "" }
                ),
            });
        }
    }

    let mut minimums: Vec<(i32, i32, bool)> = rules
        .iter()
        .filter_map(|rule| match *rule {
            BreakRule::Minimum {
                after_minutes,
                minimum,
                paid,
            } => Some((after_minutes, minimum, paid)),
            _ => None,
        })
        .collect();
    minimums.sort_by_key(|&(after_minutes, _, _)| after_minutes);

    for (after_minutes, minimum, paid) in minimums {
        if gross > after_minutes && total < minimum {
            let top_up = minimum - total;
            let deducted = if paid { 0 } else { top_up };
            total += deducted;
            details.push(BreakDetail {
                kind: BreakKind::Minimum,
                minutes: deducted,
                reason: format!(
                    "Break below minimum of {} after {} minute(s), topped up by {}{}",
                    minimum,
                    after_minutes,
                    top_up,
                    if paid { ", paid" } else { "" }
                ),
            });
        }
    }

    let total_minutes = total.min(gross);

    let audit_step = AuditStep {
        step_number,
        rule_id: "break_deduction".to_string(),
        rule_name: "Break Deduction".to_string(),
        input: serde_json::json!({
            "gross_minutes": gross,
            "booked_break_minutes": booked,
            "rules": rules.len()
        }),
        output: serde_json::json!({
            "total_minutes": total_minutes,
            "details": details
        }),
        reasoning: if total_minutes < total {
            format!(
                "{} minute(s) of break limited to gross time {}",
                total, total_minutes
            )
        } else {
            format!("{} minute(s) of break deducted", total_minutes)
        },
    };

    BreakDeduction {
        details,
        total_minutes,
        audit_step,
    }
}
