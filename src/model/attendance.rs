use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::interval::TimeInterval;

/// One row per (worker, date). Created implicitly the first time a worker's
/// day is touched; amended by confirmation/adjustment, never deleted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyAttendanceRecord {
    pub worker_id: u64,
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub standard_hours: f64,
    pub overtime_hours: f64,
    pub overtime_interval: Option<TimeInterval>,
    pub leave_hours: f64,
    pub leave_interval: Option<TimeInterval>,

    /// Effective hours of resolved exceptions credited against this day,
    /// capped at actual attendance.
    pub exception_hours: f64,
    /// Baseline attendance net of exception overlap.
    pub net_hours: f64,

    pub confirmed: bool,
    pub confirmed_by: Option<u64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub adjusted_by: Option<u64>,
    pub adjusted_at: Option<DateTime<Utc>>,
    pub note: Option<String>,

    pub version: u64,
}

impl DailyAttendanceRecord {
    pub fn new(worker_id: u64, date: NaiveDate, standard_hours: f64) -> Self {
        Self {
            worker_id,
            date,
            standard_hours,
            overtime_hours: 0.0,
            overtime_interval: None,
            leave_hours: 0.0,
            leave_interval: None,
            exception_hours: 0.0,
            net_hours: standard_hours,
            confirmed: false,
            confirmed_by: None,
            confirmed_at: None,
            adjusted_by: None,
            adjusted_at: None,
            note: None,
            version: 1,
        }
    }

    /// standard + overtime − leave. Carried at full precision; rounding only
    /// happens at the reporting boundary.
    pub fn actual_hours(&self) -> f64 {
        self.standard_hours + self.overtime_hours - self.leave_hours
    }
}
