use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::exception::IntervalPayload;
use crate::config::Config;
use crate::directory::Directory;
use crate::engine::reconcile::{reconcile_record, round_hours};
use crate::engine::workflow::Actor;
use crate::error::CoreError;
use crate::model::attendance::DailyAttendanceRecord;
use crate::model::interval::TimeInterval;
use crate::model::role::Role;
use crate::store::Store;

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub worker_id: u64,
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub standard_hours: f64,
    pub overtime_hours: f64,
    pub overtime_interval: Option<TimeInterval>,
    pub leave_hours: f64,
    pub leave_interval: Option<TimeInterval>,
    /// standard + overtime − leave, 2-decimal.
    pub actual_hours: f64,
    pub exception_hours: f64,
    pub net_hours: f64,
    pub confirmed: bool,
    pub confirmed_by: Option<u64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub adjusted_by: Option<u64>,
    pub adjusted_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub version: u64,
}

impl From<DailyAttendanceRecord> for AttendanceResponse {
    fn from(r: DailyAttendanceRecord) -> Self {
        Self {
            worker_id: r.worker_id,
            date: r.date,
            standard_hours: r.standard_hours,
            overtime_hours: r.overtime_hours,
            overtime_interval: r.overtime_interval,
            leave_hours: r.leave_hours,
            leave_interval: r.leave_interval,
            actual_hours: round_hours(r.actual_hours()),
            exception_hours: r.exception_hours,
            net_hours: r.net_hours,
            confirmed: r.confirmed,
            confirmed_by: r.confirmed_by,
            confirmed_at: r.confirmed_at,
            adjusted_by: r.adjusted_by,
            adjusted_at: r.adjusted_at,
            note: r.note,
            version: r.version,
        }
    }
}

/// `None` fields mean "leave unchanged". A recorded interval is removed via
/// the clear flags; clearing wins over a simultaneously supplied interval.
#[derive(Deserialize, ToSchema)]
pub struct AdjustAttendance {
    #[schema(example = 200)]
    pub actor_id: u64,
    pub overtime_hours: Option<f64>,
    pub overtime_interval: Option<IntervalPayload>,
    #[serde(default)]
    pub clear_overtime_interval: bool,
    pub leave_hours: Option<f64>,
    pub leave_interval: Option<IntervalPayload>,
    #[serde(default)]
    pub clear_leave_interval: bool,
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ConfirmAttendance {
    #[schema(example = 200)]
    pub actor_id: u64,
}

/// Applies one adjustment to a day's record, audit stamp and version bump
/// included. Intervals arrive pre-validated; a stale interval must not
/// outlive its hours, hence the clear flags.
fn apply_adjustment(
    r: &mut DailyAttendanceRecord,
    payload: &AdjustAttendance,
    overtime_interval: Option<TimeInterval>,
    leave_interval: Option<TimeInterval>,
    actor_id: u64,
    now: DateTime<Utc>,
) {
    if let Some(hours) = payload.overtime_hours {
        r.overtime_hours = hours;
    }
    if let Some(interval) = overtime_interval {
        r.overtime_interval = Some(interval);
    }
    if payload.clear_overtime_interval {
        r.overtime_interval = None;
    }
    if let Some(hours) = payload.leave_hours {
        r.leave_hours = hours;
    }
    if let Some(interval) = leave_interval {
        r.leave_interval = Some(interval);
    }
    if payload.clear_leave_interval {
        r.leave_interval = None;
    }
    if let Some(note) = payload.note.clone() {
        r.note = Some(note);
    }
    r.adjusted_by = Some(actor_id);
    r.adjusted_at = Some(now);
    r.version += 1;
}

fn require_supervisor_or_manager(actor: &Actor) -> Result<(), CoreError> {
    if matches!(actor.role, Role::Supervisor | Role::Manager) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "attendance records may only be amended by supervisors or managers".into(),
        ))
    }
}

/// Recompute and return one (worker, date) record. Idempotent absent
/// intervening mutations: derived fields are overwritten from the same
/// inputs and the version is left alone.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{worker_id}/{date}",
    params(
        ("worker_id" = u64, Path, description = "Worker id"),
        ("date" = String, Path, description = "Calendar day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Reconciled attendance record", body = AttendanceResponse)
    ),
    tag = "Attendance"
)]
pub async fn reconcile_day(
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<(u64, NaiveDate)>,
) -> Result<HttpResponse, CoreError> {
    let (worker_id, date) = path.into_inner();
    let claims = store.resolved_claims_for(worker_id, date);

    let record = store.with_attendance(worker_id, date, config.calendar.standard_hours, |r| {
        reconcile_record(r, &config.calendar, &claims);
        r.clone()
    });

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

/* =========================
Adjust overtime/leave (supervisor/manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{worker_id}/{date}",
    params(
        ("worker_id" = u64, Path, description = "Worker id"),
        ("date" = String, Path, description = "Calendar day, YYYY-MM-DD")
    ),
    request_body = AdjustAttendance,
    responses(
        (status = 200, description = "Adjusted attendance record", body = AttendanceResponse),
        (status = 400, description = "Invalid interval"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Attendance"
)]
pub async fn adjust_attendance(
    store: web::Data<Store>,
    config: web::Data<Config>,
    directory: web::Data<Directory>,
    path: web::Path<(u64, NaiveDate)>,
    payload: web::Json<AdjustAttendance>,
) -> Result<HttpResponse, CoreError> {
    let (worker_id, date) = path.into_inner();
    let mut payload = payload.into_inner();
    let actor = directory.actor(payload.actor_id)?;
    require_supervisor_or_manager(&actor)?;

    let overtime_interval = payload
        .overtime_interval
        .take()
        .map(|p| p.into_interval())
        .transpose()?;
    let leave_interval = payload
        .leave_interval
        .take()
        .map(|p| p.into_interval())
        .transpose()?;

    let claims = store.resolved_claims_for(worker_id, date);
    let record = store.with_attendance(worker_id, date, config.calendar.standard_hours, |r| {
        apply_adjustment(
            r,
            &payload,
            overtime_interval,
            leave_interval,
            actor.id,
            Utc::now(),
        );
        reconcile_record(r, &config.calendar, &claims);
        r.clone()
    });

    tracing::info!(worker_id, %date, actor_id = actor.id, "Attendance adjusted");
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

/* =========================
Confirm a day's record (supervisor/manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{worker_id}/{date}/confirm",
    params(
        ("worker_id" = u64, Path, description = "Worker id"),
        ("date" = String, Path, description = "Calendar day, YYYY-MM-DD")
    ),
    request_body = ConfirmAttendance,
    responses(
        (status = 200, description = "Confirmed attendance record", body = AttendanceResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Attendance"
)]
pub async fn confirm_attendance(
    store: web::Data<Store>,
    config: web::Data<Config>,
    directory: web::Data<Directory>,
    path: web::Path<(u64, NaiveDate)>,
    payload: web::Json<ConfirmAttendance>,
) -> Result<HttpResponse, CoreError> {
    let (worker_id, date) = path.into_inner();
    let actor = directory.actor(payload.actor_id)?;
    require_supervisor_or_manager(&actor)?;

    let claims = store.resolved_claims_for(worker_id, date);
    let record = store.with_attendance(worker_id, date, config.calendar.standard_hours, |r| {
        // Reconcile first so the confirmed figures are current.
        reconcile_record(r, &config.calendar, &claims);
        r.confirmed = true;
        r.confirmed_by = Some(actor.id);
        r.confirmed_at = Some(Utc::now());
        r.version += 1;
        r.clone()
    });

    tracing::info!(worker_id, %date, actor_id = actor.id, "Attendance confirmed");
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn interval(h1: u32, h2: u32) -> TimeInterval {
        TimeInterval::new(
            day().and_hms_opt(h1, 0, 0).unwrap(),
            day().and_hms_opt(h2, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn empty_payload() -> AdjustAttendance {
        AdjustAttendance {
            actor_id: 200,
            overtime_hours: None,
            overtime_interval: None,
            clear_overtime_interval: false,
            leave_hours: None,
            leave_interval: None,
            clear_leave_interval: false,
            note: None,
        }
    }

    #[test]
    fn clearing_removes_a_previously_recorded_interval() {
        let mut record = DailyAttendanceRecord::new(100, day(), 8.0);
        apply_adjustment(
            &mut record,
            &AdjustAttendance {
                overtime_hours: Some(2.0),
                ..empty_payload()
            },
            Some(interval(18, 20)),
            None,
            200,
            Utc::now(),
        );
        assert_eq!(record.overtime_interval, Some(interval(18, 20)));
        assert_eq!(record.overtime_hours, 2.0);

        // Zeroing the hours must not leave the stale interval feeding the
        // overtime-overlap computation.
        apply_adjustment(
            &mut record,
            &AdjustAttendance {
                overtime_hours: Some(0.0),
                clear_overtime_interval: true,
                ..empty_payload()
            },
            None,
            None,
            200,
            Utc::now(),
        );
        assert_eq!(record.overtime_interval, None);
        assert_eq!(record.overtime_hours, 0.0);
        assert_eq!(record.version, 3);
    }

    #[test]
    fn absent_fields_leave_the_record_unchanged() {
        let mut record = DailyAttendanceRecord::new(100, day(), 8.0);
        record.leave_hours = 1.5;
        record.leave_interval = Some(interval(16, 17));
        record.note = Some("left early".into());

        apply_adjustment(&mut record, &empty_payload(), None, None, 200, Utc::now());
        assert_eq!(record.leave_hours, 1.5);
        assert_eq!(record.leave_interval, Some(interval(16, 17)));
        assert_eq!(record.note.as_deref(), Some("left early"));
        assert_eq!(record.adjusted_by, Some(200));
    }
}
