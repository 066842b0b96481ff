use chrono::{DateTime, Utc};
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::engine::routing;
use crate::error::CoreError;
use crate::model::exception::{ClaimOverride, ExceptionReport, ExceptionStatus};
use crate::model::interval::TimeInterval;
use crate::model::role::{Department, Role};

/// Actions an actor can request against a report.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowAction {
    Approve,
    Reject,
    Confirm,
}

/// Identity plus role, resolved from the user directory before any
/// transition is attempted.
#[derive(Debug, Copy, Clone)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

fn denied(report: &ExceptionReport, action: WorkflowAction, actor: &Actor) -> CoreError {
    CoreError::InvalidTransition(format!(
        "{:?} {} may not {} report {} in state {}",
        actor.role, actor.id, action, report.id, report.status
    ))
}

/// Applies one transition from the state table. Any state/role mismatch
/// fails with `InvalidTransition` and leaves the report untouched; callers
/// run this under the per-report write lock so partial updates are never
/// observable anyway.
///
/// `pick_staff` is the staff-pool collaborator: given a department it yields
/// the confirmer to assign, or `None` when the pool is empty (the approval
/// then terminates directly).
pub fn apply(
    report: &mut ExceptionReport,
    action: WorkflowAction,
    actor: &Actor,
    note: Option<String>,
    override_claim: Option<ClaimOverride>,
    pick_staff: impl Fn(Department) -> Option<u64>,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    if override_claim.is_some()
        && !(report.status == ExceptionStatus::Pending && action == WorkflowAction::Approve)
    {
        return Err(CoreError::InvalidTransition(
            "claim override is only permitted at first approval".into(),
        ));
    }

    match (report.status, action) {
        (ExceptionStatus::Pending, WorkflowAction::Approve) => {
            if actor.role != Role::Supervisor {
                return Err(denied(report, action, actor));
            }
            report.first_approver_id = Some(actor.id);
            report.first_approved_at = Some(now);
            report.first_approval_note = note;
            report.modification = override_claim;
            report.status = ExceptionStatus::PendingSecondApproval;
            Ok(())
        }
        (ExceptionStatus::Pending, WorkflowAction::Reject) => {
            if actor.role != Role::Supervisor {
                return Err(denied(report, action, actor));
            }
            report.rejected_by = Some(actor.id);
            report.rejected_at = Some(now);
            report.rejection_note = note;
            report.status = ExceptionStatus::Rejected;
            Ok(())
        }
        (ExceptionStatus::PendingSecondApproval, WorkflowAction::Approve) => {
            if actor.role != Role::Manager {
                return Err(denied(report, action, actor));
            }
            report.second_approver_id = Some(actor.id);
            report.second_approved_at = Some(now);
            report.second_approval_note = note;

            let staff = routing::route(report.effective_claim().exception_type)
                .and_then(&pick_staff);
            match staff {
                Some(staff_id) => {
                    report.assigned_staff_id = Some(staff_id);
                    report.status = ExceptionStatus::PendingStaffConfirmation;
                }
                None => report.status = ExceptionStatus::Approved,
            }
            Ok(())
        }
        (ExceptionStatus::PendingSecondApproval, WorkflowAction::Reject) => {
            if actor.role != Role::Manager {
                return Err(denied(report, action, actor));
            }
            report.rejected_by = Some(actor.id);
            report.rejected_at = Some(now);
            report.rejection_note = note;
            report.status = ExceptionStatus::Rejected;
            Ok(())
        }
        (ExceptionStatus::PendingStaffConfirmation, WorkflowAction::Confirm) => {
            if actor.role != Role::Staff || report.assigned_staff_id != Some(actor.id) {
                return Err(denied(report, action, actor));
            }
            report.staff_confirmed_at = Some(now);
            report.staff_confirmation_note = note;
            report.status = ExceptionStatus::StaffConfirmed;
            Ok(())
        }
        _ => Err(denied(report, action, actor)),
    }
}

/// Worker re-edit of their own claim, allowed only before any approver has
/// acted.
pub fn resubmit(
    report: &mut ExceptionReport,
    actor_id: u64,
    description: Option<String>,
    interval: Option<TimeInterval>,
) -> Result<(), CoreError> {
    if report.status != ExceptionStatus::Pending {
        return Err(CoreError::InvalidTransition(format!(
            "report {} can no longer be edited in state {}",
            report.id, report.status
        )));
    }
    if report.worker_id != actor_id {
        return Err(CoreError::Forbidden(
            "only the submitting worker may edit a pending report".into(),
        ));
    }
    if let Some(description) = description {
        report.description = description;
    }
    if let Some(interval) = interval {
        report.interval = interval;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::exception::ExceptionType;
    use chrono::NaiveDate;

    fn interval() -> TimeInterval {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        TimeInterval::new(
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(11, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn report(exception_type: ExceptionType) -> ExceptionReport {
        ExceptionReport::new(
            1,
            10,
            100,
            exception_type,
            "line stopped".into(),
            interval(),
            Utc::now(),
        )
    }

    const SUPERVISOR: Actor = Actor {
        id: 200,
        role: Role::Supervisor,
    };
    const MANAGER: Actor = Actor {
        id: 300,
        role: Role::Manager,
    };

    fn pmc_pool(d: Department) -> Option<u64> {
        (d == Department::Pmc).then_some(400)
    }

    #[test]
    fn pending_accepts_only_supervisor_approve_or_reject() {
        for actor in [
            Actor { id: 100, role: Role::Worker },
            Actor { id: 400, role: Role::Staff },
            MANAGER,
        ] {
            let mut r = report(ExceptionType::Rework);
            let err = apply(
                &mut r,
                WorkflowAction::Approve,
                &actor,
                None,
                None,
                |_| None,
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition(_)));
            assert_eq!(r.status, ExceptionStatus::Pending);
            assert_eq!(r.first_approver_id, None);
        }

        let mut r = report(ExceptionType::Rework);
        apply(
            &mut r,
            WorkflowAction::Approve,
            &SUPERVISOR,
            Some("checked on the floor".into()),
            None,
            |_| None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(r.status, ExceptionStatus::PendingSecondApproval);
        assert_eq!(r.first_approver_id, Some(SUPERVISOR.id));
    }

    #[test]
    fn routed_type_lands_in_staff_confirmation_with_assignee() {
        let mut r = report(ExceptionType::MissingMaterial);
        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        apply(&mut r, WorkflowAction::Approve, &MANAGER, None, None, pmc_pool, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::PendingStaffConfirmation);
        assert_eq!(r.assigned_staff_id, Some(400));
    }

    #[test]
    fn unrouted_type_is_approved_directly() {
        let mut r = report(ExceptionType::AdHocTaskAssignment);
        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        apply(&mut r, WorkflowAction::Approve, &MANAGER, None, None, pmc_pool, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::Approved);
        assert_eq!(r.assigned_staff_id, None);
    }

    #[test]
    fn empty_staff_pool_falls_back_to_direct_approval() {
        let mut r = report(ExceptionType::MissingMaterial);
        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        apply(&mut r, WorkflowAction::Approve, &MANAGER, None, None, |_| None, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::Approved);
    }

    #[test]
    fn only_the_assigned_staff_member_may_confirm() {
        let mut r = report(ExceptionType::MissingMaterial);
        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        apply(&mut r, WorkflowAction::Approve, &MANAGER, None, None, pmc_pool, Utc::now())
            .unwrap();

        let other_staff = Actor { id: 401, role: Role::Staff };
        let err = apply(
            &mut r,
            WorkflowAction::Confirm,
            &other_staff,
            None,
            None,
            pmc_pool,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));

        let assigned = Actor { id: 400, role: Role::Staff };
        apply(&mut r, WorkflowAction::Confirm, &assigned, Some("restocked".into()), None, pmc_pool, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::StaffConfirmed);
        assert!(r.staff_confirmed_at.is_some());
    }

    #[test]
    fn rejection_never_populates_approver_fields() {
        // Supervisor rejection from pending.
        let mut r = report(ExceptionType::Rework);
        apply(&mut r, WorkflowAction::Reject, &SUPERVISOR, Some("duplicate".into()), None, |_| None, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::Rejected);
        assert_eq!(r.first_approver_id, None);
        assert_eq!(r.first_approved_at, None);
        assert_eq!(r.rejected_by, Some(SUPERVISOR.id));
        assert_eq!(r.rejection_note.as_deref(), Some("duplicate"));

        // Manager rejection from pending_second_approval: the first approval
        // stays on record, the second approver fields stay empty.
        let mut r = report(ExceptionType::Rework);
        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        apply(&mut r, WorkflowAction::Reject, &MANAGER, Some("no budget".into()), None, |_| None, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::Rejected);
        assert_eq!(r.first_approver_id, Some(SUPERVISOR.id));
        assert_eq!(r.second_approver_id, None);
        assert_eq!(r.second_approved_at, None);
        assert_eq!(r.rejected_by, Some(MANAGER.id));
        assert_eq!(r.rejection_note.as_deref(), Some("no budget"));
    }

    #[test]
    fn terminal_states_accept_no_further_transitions() {
        let mut r = report(ExceptionType::Rework);
        apply(&mut r, WorkflowAction::Reject, &SUPERVISOR, Some("not an exception".into()), None, |_| None, Utc::now())
            .unwrap();
        assert_eq!(r.status, ExceptionStatus::Rejected);
        assert!(r.status.is_terminal());

        let err = apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
    }

    #[test]
    fn override_is_recorded_at_first_approval_and_drives_routing() {
        let mut r = report(ExceptionType::AdHocTaskAssignment);
        apply(
            &mut r,
            WorkflowAction::Approve,
            &SUPERVISOR,
            None,
            Some(ClaimOverride {
                exception_type: ExceptionType::MissingMaterial,
                description: "was actually a stock-out".into(),
                interval: interval(),
            }),
            |_| None,
            Utc::now(),
        )
        .unwrap();
        apply(&mut r, WorkflowAction::Approve, &MANAGER, None, None, pmc_pool, Utc::now())
            .unwrap();
        // Routing follows the effective (overridden) type, not the original.
        assert_eq!(r.status, ExceptionStatus::PendingStaffConfirmation);
        assert_eq!(r.exception_type, ExceptionType::AdHocTaskAssignment);
    }

    #[test]
    fn override_outside_first_approval_is_rejected() {
        let mut r = report(ExceptionType::Rework);
        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        let err = apply(
            &mut r,
            WorkflowAction::Approve,
            &MANAGER,
            None,
            Some(ClaimOverride {
                exception_type: ExceptionType::Rework,
                description: "late edit".into(),
                interval: interval(),
            }),
            |_| None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
        assert_eq!(r.status, ExceptionStatus::PendingSecondApproval);
    }

    #[test]
    fn worker_may_edit_only_while_pending() {
        let mut r = report(ExceptionType::Rework);
        resubmit(&mut r, 100, Some("updated description".into()), None).unwrap();
        assert_eq!(r.description, "updated description");

        assert!(matches!(
            resubmit(&mut r, 999, None, None),
            Err(CoreError::Forbidden(_))
        ));

        apply(&mut r, WorkflowAction::Approve, &SUPERVISOR, None, None, |_| None, Utc::now())
            .unwrap();
        assert!(matches!(
            resubmit(&mut r, 100, Some("too late".into()), None),
            Err(CoreError::InvalidTransition(_))
        ));
    }
}
