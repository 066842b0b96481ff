use chrono::NaiveDate;

use crate::model::attendance::DailyAttendanceRecord;
use crate::model::calendar::WorkCalendarConfig;
use crate::model::interval::TimeInterval;

/// Two-decimal rounding for the reporting boundary. Intermediate values carry
/// full precision so rounding error cannot compound across multi-day
/// exceptions.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Hours of `exception` falling inside scheduled work windows plus recorded
/// overtime on `day`. Both the exception and the overtime interval are
/// clipped to the day first; overlapping an unclipped multi-day interval
/// against single-day windows silently drops or double-counts hours.
pub fn raw_overlap_for_day(
    calendar: &WorkCalendarConfig,
    exception: &TimeInterval,
    overtime: Option<&TimeInterval>,
    day: NaiveDate,
) -> f64 {
    let Some(exception_on_day) = exception.clip_to_day(day) else {
        return 0.0;
    };

    let scheduled: f64 = calendar
        .work_windows_for_day(day)
        .iter()
        .map(|window| window.overlap_hours(&exception_on_day))
        .sum();

    // Overtime sits outside the work windows, so it is accounted separately.
    let overtime_overlap = overtime
        .and_then(|ot| ot.clip_to_day(day))
        .map(|ot| ot.overlap_hours(&exception_on_day))
        .unwrap_or(0.0);

    scheduled + overtime_overlap
}

/// Effective hours one exception claim contributes to `day`: the raw overlap
/// capped at the day's actual attendance. An exception explains at most all
/// of the day's attendance, never more.
pub fn effective_hours_for_day(
    calendar: &WorkCalendarConfig,
    exception: &TimeInterval,
    record: Option<&DailyAttendanceRecord>,
    day: NaiveDate,
) -> f64 {
    let overtime = record.and_then(|r| r.overtime_interval.as_ref());
    let raw = raw_overlap_for_day(calendar, exception, overtime, day);
    let actual = record.map(|r| r.actual_hours()).unwrap_or(0.0);
    raw.min(actual).max(0.0)
}

/// Total effective hours of one exception claim across every day it touches,
/// unrounded. `record_for` is the attendance lookup collaborator.
pub fn exception_effective_hours<'a>(
    calendar: &WorkCalendarConfig,
    claim: &TimeInterval,
    record_for: impl Fn(NaiveDate) -> Option<&'a DailyAttendanceRecord>,
) -> f64 {
    claim
        .days()
        .into_iter()
        .map(|day| effective_hours_for_day(calendar, claim, record_for(day), day))
        .sum()
}

/// Recomputes the derived reconciliation fields of one day's record from the
/// resolved exception claims touching it. The per-claim cap already bounds
/// each contribution; the summed credit is additionally capped at the day's
/// actual attendance so several exceptions cannot together explain more time
/// than was clocked. Deterministic, so re-running without intervening
/// mutations reproduces the same record.
pub fn reconcile_record(
    record: &mut DailyAttendanceRecord,
    calendar: &WorkCalendarConfig,
    claims: &[TimeInterval],
) {
    let snapshot = record.clone();
    let actual = snapshot.actual_hours().max(0.0);
    let credited: f64 = claims
        .iter()
        .map(|claim| effective_hours_for_day(calendar, claim, Some(&snapshot), snapshot.date))
        .sum();
    record.exception_hours = round_hours(credited.min(actual));
    record.net_hours = round_hours(actual - credited.min(actual));
}
