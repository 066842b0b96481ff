use crate::api::attendance::{AdjustAttendance, AttendanceResponse, ConfirmAttendance};
use crate::api::exception::{
    DecisionRequest, ExceptionHoursResponse, ExceptionListResponse, IntervalPayload,
    OverridePayload, SubmitException, UpdateException,
};
use crate::model::exception::{ClaimOverride, ExceptionReport, ExceptionStatus, ExceptionType};
use crate::model::interval::TimeInterval;
use crate::model::role::{Department, Role};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Factory Floor Exception & Hours API",
        version = "1.0.0",
        description = r#"
## Factory-floor exception approval and hours reconciliation

Workers report exceptional time (missing material, incoming quality defects,
rework, ad-hoc task assignments) against a task. Reports pass a two-stage
supervisor/manager approval and, for routed types, a department staff
confirmation. Resolved exception intervals are reconciled against the work
calendar and each day's attendance into effective hours.

### Response format
- JSON-based RESTful responses
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::exception::submit_exception,
        crate::api::exception::exception_list,
        crate::api::exception::get_exception,
        crate::api::exception::update_exception,
        crate::api::exception::approve_exception,
        crate::api::exception::reject_exception,
        crate::api::exception::confirm_exception,
        crate::api::exception::exception_hours,

        crate::api::attendance::reconcile_day,
        crate::api::attendance::adjust_attendance,
        crate::api::attendance::confirm_attendance
    ),
    components(
        schemas(
            TimeInterval,
            IntervalPayload,
            ExceptionType,
            ExceptionStatus,
            ExceptionReport,
            ClaimOverride,
            Role,
            Department,
            SubmitException,
            UpdateException,
            OverridePayload,
            DecisionRequest,
            ExceptionListResponse,
            ExceptionHoursResponse,
            AttendanceResponse,
            AdjustAttendance,
            ConfirmAttendance
        )
    ),
    tags(
        (name = "Exception", description = "Exception report workflow APIs"),
        (name = "Attendance", description = "Attendance reconciliation APIs"),
    )
)]
pub struct ApiDoc;
