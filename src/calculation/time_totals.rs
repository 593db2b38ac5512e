//! Gross, net and target time.

use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, CalculationNotes, WarningCode};

/// The minute totals of one day.
///
/// Always satisfies `net_time == gross_time - break_time` and the
/// overtime/undertime invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTotals {
    /// Credited work time (worked plus credited, minus capped).
    pub gross_time: i32,
    /// Gross time minus break time.
    pub net_time: i32,
    /// Expected net time.
    pub target_time: i32,
    /// Net time above target.
    pub overtime: i32,
    /// Net time below target.
    pub undertime: i32,
    /// Break minutes actually deducted.
    pub break_time: i32,
    /// Minutes removed by the maximum net time.
    pub capped_time: i32,
    /// Minutes credited by a holiday or absence.
    pub credited_time: i32,
    /// `MAX_NET_TIME_EXCEEDED` if the cap applied.
    pub notes: CalculationNotes,
    /// The audit step recording the totals.
    pub audit_step: AuditStep,
}

/// Computes a day's totals from worked, credited and break minutes.
///
/// Gross time is `worked_minutes + credited_minutes`; break time is limited
/// to gross time so net time is never negative. When `max_net_minutes` is set
/// and net time exceeds it, the excess is moved to `capped_time` and taken off
/// gross time as well, and `MAX_NET_TIME_EXCEEDED` is recorded. Overtime and
/// undertime are computed from the capped net time.
///
/// # Examples
///
/// ```
/// use worktime_engine::calculation::calculate_time_totals;
///
/// let totals = calculate_time_totals(540, 0, 30, 480, None, 1);
/// assert_eq!(totals.net_time, 510);
/// assert_eq!(totals.overtime, 30);
/// assert_eq!(totals.undertime, 0);
/// ```
///
/// ```
/// use worktime_engine::calculation::calculate_time_totals;
/// use worktime_engine::models::WarningCode;
///
/// let totals = calculate_time_totals(720, 0, 30, 480, Some(600), 1);
/// assert_eq!(totals.net_time, 600);
/// assert_eq!(totals.capped_time, 90);
/// assert_eq!(totals.gross_time, 630);
/// assert!(totals.notes.warnings.contains(&WarningCode::MaxNetTimeExceeded));
/// ```
pub fn calculate_time_totals(
    worked_minutes: i32,
    credited_minutes: i32,
    break_minutes: i32,
    target_minutes: i32,
    max_net_minutes: Option<i32>,
    step_number: u32,
) -> TimeTotals {
    let uncapped_gross = worked_minutes.max(0) + credited_minutes.max(0);
    let break_time = break_minutes.clamp(0, uncapped_gross);
    let uncapped_net = uncapped_gross - break_time;

    let mut notes = CalculationNotes::default();
    let capped_time = match max_net_minutes {
        Some(max_net) if uncapped_net > max_net => {
            notes = notes.with_warning(WarningCode::MaxNetTimeExceeded);
            uncapped_net - max_net
        }
        _ => 0,
    };

    let gross_time = uncapped_gross - capped_time;
    let net_time = gross_time - break_time;
    let overtime = (net_time - target_minutes).max(0);
    let undertime = (target_minutes - net_time).max(0);

    let reasoning = if capped_time > 0 {
        format!(
            "Net time {} capped to {}; {} minute(s) not credited",
            uncapped_net, net_time, capped_time
        )
    } else if overtime > 0 {
        format!("Net time {} exceeds target {} by {}", net_time, target_minutes, overtime)
    } else if undertime > 0 {
        format!("Net time {} is {} below target {}", net_time, undertime, target_minutes)
    } else {
        format!("Net time {} meets target {}", net_time, target_minutes)
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "time_totals".to_string(),
        rule_name: "Gross, Net and Target Time".to_string(),
        input: serde_json::json!({
            "worked_minutes": worked_minutes,
            "credited_minutes": credited_minutes,
            "break_minutes": break_minutes,
            "target_minutes": target_minutes,
            "max_net_minutes": max_net_minutes
        }),
        output: serde_json::json!({
            "gross_time": gross_time,
            "net_time": net_time,
            "overtime": overtime,
            "undertime": undertime,
            "capped_time": capped_time
        }),
        reasoning,
    };

    TimeTotals {
        gross_time,
        net_time,
        target_time: target_minutes,
        overtime,
        undertime,
        break_time,
        capped_time,
        credited_time: credited_minutes.max(0),
        notes,
        audit_step,
    }
}
