use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::CoreError;

/// Half-open civil-time range `[start, end)`.
///
/// Fields are private so the `start < end` invariant can only be established
/// through [`TimeInterval::new`]; zero-duration and inverted ranges are
/// rejected at construction and never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TimeInterval {
    #[schema(example = "2026-03-02T08:30:00", value_type = String, format = "date-time")]
    start: NaiveDateTime,
    #[schema(example = "2026-03-02T17:50:00", value_type = String, format = "date-time")]
    end: NaiveDateTime,
}

impl TimeInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::InvalidInterval);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Intersection of two intervals, if any. Abutting intervals do not
    /// intersect under half-open semantics.
    pub fn intersect(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(TimeInterval { start, end })
        } else {
            None
        }
    }

    /// Hours of overlap between two intervals; 0 when disjoint or abutting.
    /// Commutative and total.
    pub fn overlap_hours(&self, other: &TimeInterval) -> f64 {
        self.intersect(other)
            .map(|i| i.duration_hours())
            .unwrap_or(0.0)
    }

    /// Intersects with `[00:00, 24:00)` of `day`; `None` when disjoint.
    pub fn clip_to_day(&self, day: NaiveDate) -> Option<TimeInterval> {
        let day_start = day.and_hms_opt(0, 0, 0)?;
        let day_end = day.succ_opt()?.and_hms_opt(0, 0, 0)?;
        self.intersect(&TimeInterval {
            start: day_start,
            end: day_end,
        })
    }

    /// Calendar days this interval touches, in order. The half-open end means
    /// an interval ending exactly at midnight does not touch the next day.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start.date();
        loop {
            if self.clip_to_day(day).is_some() {
                days.push(day);
            } else {
                break;
            }
            day = match day.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }
        days
    }
}

/// Removes `break_interval` from each window: a window the break strictly
/// splits yields up to two sub-windows, windows disjoint from the break pass
/// through unchanged. Chronological order of the inputs is preserved.
pub fn split_by_break(windows: &[TimeInterval], break_interval: &TimeInterval) -> Vec<TimeInterval> {
    let mut out = Vec::with_capacity(windows.len() + 1);
    for window in windows {
        match window.intersect(break_interval) {
            None => out.push(*window),
            Some(cut) => {
                if window.start < cut.start {
                    out.push(TimeInterval {
                        start: window.start,
                        end: cut.start,
                    });
                }
                if cut.end < window.end {
                    out.push(TimeInterval {
                        start: cut.end,
                        end: window.end,
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn iv(d1: u32, h1: u32, m1: u32, d2: u32, h2: u32, m2: u32) -> TimeInterval {
        TimeInterval::new(dt(d1, h1, m1), dt(d2, h2, m2)).unwrap()
    }

    #[test]
    fn rejects_inverted_and_zero_duration() {
        assert_eq!(
            TimeInterval::new(dt(1, 10, 0), dt(1, 10, 0)),
            Err(CoreError::InvalidInterval)
        );
        assert_eq!(
            TimeInterval::new(dt(1, 10, 0), dt(1, 9, 0)),
            Err(CoreError::InvalidInterval)
        );
    }

    #[test]
    fn overlap_is_commutative_and_self_overlap_is_duration() {
        let a = iv(1, 8, 0, 1, 12, 0);
        let b = iv(1, 10, 0, 1, 14, 0);
        assert_eq!(a.overlap_hours(&b), b.overlap_hours(&a));
        assert_eq!(a.overlap_hours(&b), 2.0);
        assert_eq!(a.overlap_hours(&a), a.duration_hours());
    }

    #[test]
    fn disjoint_and_abutting_intervals_do_not_overlap() {
        let a = iv(1, 8, 0, 1, 10, 0);
        let abutting = iv(1, 10, 0, 1, 12, 0);
        let disjoint = iv(1, 13, 0, 1, 14, 0);
        assert_eq!(a.overlap_hours(&abutting), 0.0);
        assert_eq!(a.overlap_hours(&disjoint), 0.0);
    }

    #[test]
    fn clip_to_day_keeps_only_the_requested_day() {
        let cross = iv(1, 18, 0, 2, 6, 0);
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();

        assert_eq!(cross.clip_to_day(d1).unwrap(), iv(1, 18, 0, 2, 0, 0));
        assert_eq!(cross.clip_to_day(d2).unwrap(), iv(2, 0, 0, 2, 6, 0));
        assert_eq!(cross.clip_to_day(d3), None);
    }

    #[test]
    fn interval_ending_at_midnight_does_not_touch_next_day() {
        let a = iv(1, 20, 0, 2, 0, 0);
        assert_eq!(
            a.days(),
            vec![NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()]
        );
    }

    #[test]
    fn days_spans_every_touched_date() {
        let a = iv(1, 18, 0, 3, 6, 0);
        assert_eq!(
            a.days(),
            vec![
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn split_by_break_passes_through_disjoint_windows() {
        let windows = vec![iv(1, 8, 0, 1, 12, 0)];
        let brk = iv(1, 14, 0, 1, 15, 0);
        assert_eq!(split_by_break(&windows, &brk), windows);
    }

    #[test]
    fn split_by_break_splits_a_covered_window_in_two() {
        let windows = vec![iv(1, 8, 0, 1, 12, 0)];
        let brk = iv(1, 10, 0, 1, 10, 30);
        assert_eq!(
            split_by_break(&windows, &brk),
            vec![iv(1, 8, 0, 1, 10, 0), iv(1, 10, 30, 1, 12, 0)]
        );
    }

    #[test]
    fn split_by_break_drops_a_fully_covered_window() {
        let windows = vec![iv(1, 9, 0, 1, 10, 0)];
        let brk = iv(1, 8, 0, 1, 11, 0);
        assert!(split_by_break(&windows, &brk).is_empty());
    }

    #[test]
    fn split_by_break_trims_a_partial_overlap() {
        let windows = vec![iv(1, 8, 0, 1, 12, 0)];
        let brk = iv(1, 11, 0, 1, 13, 0);
        assert_eq!(split_by_break(&windows, &brk), vec![iv(1, 8, 0, 1, 11, 0)]);
    }
}
