use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::directory::Directory;
use crate::engine::reconcile::{exception_effective_hours, round_hours};
use crate::engine::workflow::{self, WorkflowAction};
use crate::error::CoreError;
use crate::model::attendance::DailyAttendanceRecord;
use crate::model::exception::{ClaimOverride, ExceptionReport, ExceptionStatus, ExceptionType};
use crate::model::interval::TimeInterval;
use crate::model::role::{Department, Role};
use crate::store::{ReportFilter, Store};

#[derive(Deserialize, ToSchema)]
pub struct IntervalPayload {
    #[schema(example = "2026-03-02T08:30:00", value_type = String, format = "date-time")]
    pub start: NaiveDateTime,
    #[schema(example = "2026-03-02T17:50:00", value_type = String, format = "date-time")]
    pub end: NaiveDateTime,
}

impl IntervalPayload {
    pub(crate) fn into_interval(self) -> Result<TimeInterval, CoreError> {
        TimeInterval::new(self.start, self.end)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitException {
    #[schema(example = 100)]
    pub worker_id: u64,
    #[schema(example = 10)]
    pub task_id: u64,
    #[schema(example = "missing_material")]
    pub exception_type: ExceptionType,
    #[schema(example = "waited for brackets from the PMC warehouse")]
    pub description: String,
    pub interval: IntervalPayload,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateException {
    #[schema(example = 100)]
    pub actor_id: u64,
    pub description: Option<String>,
    pub interval: Option<IntervalPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct OverridePayload {
    pub exception_type: ExceptionType,
    pub description: String,
    pub interval: IntervalPayload,
}

/// Shared payload for approve/reject/confirm. `expected_version` enables the
/// optimistic concurrency check; `modification` is only honored at first
/// approval.
#[derive(Deserialize, ToSchema)]
pub struct DecisionRequest {
    #[schema(example = 200)]
    pub actor_id: u64,
    pub note: Option<String>,
    #[schema(example = 1)]
    pub expected_version: Option<u64>,
    pub modification: Option<OverridePayload>,
}

#[derive(Deserialize, IntoParams)]
pub struct ExceptionFilter {
    /// Filter by workflow status
    pub status: Option<String>,
    /// Filter by submitting worker
    pub worker_id: Option<u64>,
    /// Filter by task
    pub task_id: Option<u64>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ExceptionListResponse {
    pub data: Vec<ExceptionReport>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Serialize, ToSchema)]
pub struct ExceptionHoursResponse {
    #[schema(example = 1)]
    pub report_id: u64,
    /// Total effective hours across the exception's span, 2-decimal.
    #[schema(example = 9.67)]
    pub effective_hours: f64,
}

/* =========================
Submit exception report
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/exception",
    request_body = SubmitException,
    responses(
        (status = 200, description = "Exception report submitted", body = ExceptionReport),
        (status = 400, description = "Invalid interval"),
        (status = 403, description = "Actor is not a worker")
    ),
    tag = "Exception"
)]
pub async fn submit_exception(
    store: web::Data<Store>,
    directory: web::Data<Directory>,
    payload: web::Json<SubmitException>,
) -> Result<HttpResponse, CoreError> {
    let payload = payload.into_inner();
    if directory.role_of(payload.worker_id) != Some(Role::Worker) {
        return Err(CoreError::Forbidden(
            "only workers may submit exception reports".into(),
        ));
    }

    let interval = payload.interval.into_interval()?;
    let report = store.insert_report(|id| {
        ExceptionReport::new(
            id,
            payload.task_id,
            payload.worker_id,
            payload.exception_type,
            payload.description.clone(),
            interval,
            Utc::now(),
        )
    });

    tracing::info!(
        report_id = report.id,
        worker_id = report.worker_id,
        exception_type = %report.exception_type,
        "Exception report submitted"
    );
    Ok(HttpResponse::Ok().json(report))
}

/* =========================
List exception reports
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/exception",
    params(ExceptionFilter),
    responses(
        (status = 200, description = "Paginated exception list", body = ExceptionListResponse),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "Exception"
)]
pub async fn exception_list(
    store: web::Data<Store>,
    query: web::Query<ExceptionFilter>,
) -> actix_web::Result<HttpResponse> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<ExceptionStatus>().map_err(|_| {
            actix_web::error::ErrorBadRequest(format!("unknown status {:?}", raw))
        })?),
        None => None,
    };

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let reports = store.list_reports(&ReportFilter {
        status,
        worker_id: query.worker_id,
        task_id: query.task_id,
    });
    let total = reports.len() as u64;
    let data: Vec<ExceptionReport> = reports
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    Ok(HttpResponse::Ok().json(ExceptionListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/* =========================
Fetch one report
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/exception/{id}",
    params(("id" = u64, Path, description = "Exception report id")),
    responses(
        (status = 200, description = "Exception report", body = ExceptionReport),
        (status = 404, description = "Not found")
    ),
    tag = "Exception"
)]
pub async fn get_exception(
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> Result<HttpResponse, CoreError> {
    let report = store.get_report(path.into_inner())?;
    Ok(HttpResponse::Ok().json(report))
}

/* =========================
Worker re-edit while pending
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/exception/{id}",
    params(("id" = u64, Path, description = "Exception report id")),
    request_body = UpdateException,
    responses(
        (status = 200, description = "Report updated", body = ExceptionReport),
        (status = 403, description = "Not the submitting worker"),
        (status = 409, description = "Report already entered approval")
    ),
    tag = "Exception"
)]
pub async fn update_exception(
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<UpdateException>,
) -> Result<HttpResponse, CoreError> {
    let payload = payload.into_inner();
    let interval = payload.interval.map(|p| p.into_interval()).transpose()?;

    let report = store.update_report(path.into_inner(), None, |r| {
        workflow::resubmit(r, payload.actor_id, payload.description.clone(), interval)
    })?;
    Ok(HttpResponse::Ok().json(report))
}

fn transition(
    store: &Store,
    directory: &Directory,
    report_id: u64,
    action: WorkflowAction,
    payload: DecisionRequest,
) -> Result<ExceptionReport, CoreError> {
    let actor = directory.actor(payload.actor_id)?;
    let modification = payload
        .modification
        .map(|m| {
            Ok::<_, CoreError>(ClaimOverride {
                exception_type: m.exception_type,
                description: m.description,
                interval: m.interval.into_interval()?,
            })
        })
        .transpose()?;

    let pick_staff =
        |department: Department| directory.staff_pool(department).first().copied();

    let report = store.update_report(report_id, payload.expected_version, |r| {
        workflow::apply(
            r,
            action,
            &actor,
            payload.note.clone(),
            modification.clone(),
            pick_staff,
            Utc::now(),
        )
    })?;

    tracing::info!(
        report_id,
        actor_id = actor.id,
        action = %action,
        status = %report.status,
        "Exception transition applied"
    );
    Ok(report)
}

/* =========================
Approve (supervisor, then manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/exception/{id}/approve",
    params(("id" = u64, Path, description = "Exception report id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Approval recorded", body = ExceptionReport),
        (status = 403, description = "Actor unknown"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Invalid transition or stale version")
    ),
    tag = "Exception"
)]
pub async fn approve_exception(
    store: web::Data<Store>,
    directory: web::Data<Directory>,
    path: web::Path<u64>,
    payload: web::Json<DecisionRequest>,
) -> Result<HttpResponse, CoreError> {
    let report = transition(
        &store,
        &directory,
        path.into_inner(),
        WorkflowAction::Approve,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(report))
}

/* =========================
Reject (supervisor or manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/exception/{id}/reject",
    params(("id" = u64, Path, description = "Exception report id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Rejection recorded", body = ExceptionReport),
        (status = 403, description = "Actor unknown"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Invalid transition or stale version")
    ),
    tag = "Exception"
)]
pub async fn reject_exception(
    store: web::Data<Store>,
    directory: web::Data<Directory>,
    path: web::Path<u64>,
    payload: web::Json<DecisionRequest>,
) -> Result<HttpResponse, CoreError> {
    let report = transition(
        &store,
        &directory,
        path.into_inner(),
        WorkflowAction::Reject,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(report))
}

/* =========================
Staff confirmation
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/exception/{id}/confirm",
    params(("id" = u64, Path, description = "Exception report id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Confirmation recorded", body = ExceptionReport),
        (status = 403, description = "Actor unknown"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Invalid transition or stale version")
    ),
    tag = "Exception"
)]
pub async fn confirm_exception(
    store: web::Data<Store>,
    directory: web::Data<Directory>,
    path: web::Path<u64>,
    payload: web::Json<DecisionRequest>,
) -> Result<HttpResponse, CoreError> {
    let report = transition(
        &store,
        &directory,
        path.into_inner(),
        WorkflowAction::Confirm,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(report))
}

/* =========================
Effective hours for audit
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/exception/{id}/hours",
    params(("id" = u64, Path, description = "Exception report id")),
    responses(
        (status = 200, description = "Total effective hours", body = ExceptionHoursResponse),
        (status = 404, description = "Not found"),
        (status = 409, description = "Report is not resolved yet")
    ),
    tag = "Exception"
)]
pub async fn exception_hours(
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, CoreError> {
    let report = store.get_report(path.into_inner())?;
    if !report.status.is_resolved() {
        return Err(CoreError::InvalidTransition(format!(
            "report {} is not resolved yet ({})",
            report.id, report.status
        )));
    }

    let claim = report.effective_claim();
    let records: HashMap<NaiveDate, DailyAttendanceRecord> = claim
        .interval
        .days()
        .into_iter()
        .filter_map(|day| {
            store
                .attendance_record(report.worker_id, day)
                .map(|r| (day, r))
        })
        .collect();

    let total = exception_effective_hours(&config.calendar, &claim.interval, |day| {
        records.get(&day)
    });

    Ok(HttpResponse::Ok().json(ExceptionHoursResponse {
        report_id: report.id,
        effective_hours: round_hours(total),
    }))
}
