use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::error::CoreError;
use crate::model::interval::{TimeInterval, split_by_break};

/// Per-shift work calendar: shift boundaries, lunch, and an optional secondary
/// break, all as times of day. Owned by configuration; read-only to the
/// reconciliation engine.
#[derive(Debug, Clone, Serialize)]
pub struct WorkCalendarConfig {
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    /// Standard attendance hours credited for a full worked day.
    pub standard_hours: f64,
}

impl WorkCalendarConfig {
    pub fn new(
        shift_start: NaiveTime,
        shift_end: NaiveTime,
        lunch_start: NaiveTime,
        lunch_end: NaiveTime,
        secondary_break: Option<(NaiveTime, NaiveTime)>,
        standard_hours: f64,
    ) -> Result<Self, CoreError> {
        // Ordering must hold so window construction below cannot fail.
        if !(shift_start < lunch_start && lunch_start < lunch_end && lunch_end < shift_end) {
            return Err(CoreError::InvalidInterval);
        }
        if let Some((bs, be)) = secondary_break {
            if bs >= be {
                return Err(CoreError::InvalidInterval);
            }
        }
        Ok(Self {
            shift_start,
            shift_end,
            lunch_start,
            lunch_end,
            break_start: secondary_break.map(|(bs, _)| bs),
            break_end: secondary_break.map(|(_, be)| be),
            standard_hours,
        })
    }

    /// Scheduled work windows for `day`: the morning and afternoon halves
    /// around lunch, with the secondary break carved out if configured.
    /// Deterministic; consults no per-worker data.
    pub fn work_windows_for_day(&self, day: NaiveDate) -> Vec<TimeInterval> {
        let windows: Vec<TimeInterval> = [
            (self.shift_start, self.lunch_start),
            (self.lunch_end, self.shift_end),
        ]
        .into_iter()
        .filter_map(|(s, e)| TimeInterval::new(day.and_time(s), day.and_time(e)).ok())
        .collect();

        match (self.break_start, self.break_end) {
            (Some(bs), Some(be)) => {
                match TimeInterval::new(day.and_time(bs), day.and_time(be)) {
                    Ok(brk) => split_by_break(&windows, &brk),
                    Err(_) => windows,
                }
            }
            _ => windows,
        }
    }
}
