use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::interval::TimeInterval;

/// Exceptional-time categories workers can report against a task.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExceptionType {
    MissingMaterial,
    IncomingQualityDefect,
    Rework,
    AdHocTaskAssignment,
}

/// Workflow states of an exception report. Valid transitions are enumerated in
/// one place (`engine::workflow`), never re-derived at call sites.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExceptionStatus {
    Pending,
    PendingSecondApproval,
    PendingStaffConfirmation,
    Approved,
    StaffConfirmed,
    Rejected,
}

impl ExceptionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExceptionStatus::Approved | ExceptionStatus::StaffConfirmed | ExceptionStatus::Rejected
        )
    }

    /// A resolved report's interval feeds the hours reconciliation engine.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            ExceptionStatus::Approved | ExceptionStatus::StaffConfirmed
        )
    }
}

/// A supervisor's edit of the worker's original claim. Type, description and
/// interval are overridden as a unit; readers must never mix one raw field
/// with one modified field.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimOverride {
    pub exception_type: ExceptionType,
    pub description: String,
    pub interval: TimeInterval,
}

/// The claim downstream logic should act on: the override when one was
/// recorded, otherwise the worker's original submission.
#[derive(Debug, Clone)]
pub struct EffectiveClaim {
    pub exception_type: ExceptionType,
    pub description: String,
    pub interval: TimeInterval,
}

/// One reported exceptional-time claim and its approval audit trail.
/// Original claim fields stay untouched after submission; supervisor edits
/// land in `modification`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExceptionReport {
    pub id: u64,
    pub task_id: u64,
    pub worker_id: u64,
    pub exception_type: ExceptionType,
    pub description: String,
    pub interval: TimeInterval,
    pub status: ExceptionStatus,

    pub first_approver_id: Option<u64>,
    pub first_approved_at: Option<DateTime<Utc>>,
    pub first_approval_note: Option<String>,

    pub second_approver_id: Option<u64>,
    pub second_approved_at: Option<DateTime<Utc>>,
    pub second_approval_note: Option<String>,

    pub modification: Option<ClaimOverride>,

    // Rejection has its own audit trail: approver fields stay null unless an
    // approval actually happened, so status and approval fields can never
    // disagree.
    pub rejected_by: Option<u64>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_note: Option<String>,

    pub assigned_staff_id: Option<u64>,
    pub staff_confirmed_at: Option<DateTime<Utc>>,
    pub staff_confirmation_note: Option<String>,

    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation; used for the optimistic concurrency check.
    pub version: u64,
}

impl ExceptionReport {
    pub fn new(
        id: u64,
        task_id: u64,
        worker_id: u64,
        exception_type: ExceptionType,
        description: String,
        interval: TimeInterval,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            worker_id,
            exception_type,
            description,
            interval,
            status: ExceptionStatus::Pending,
            first_approver_id: None,
            first_approved_at: None,
            first_approval_note: None,
            second_approver_id: None,
            second_approved_at: None,
            second_approval_note: None,
            modification: None,
            rejected_by: None,
            rejected_at: None,
            rejection_note: None,
            assigned_staff_id: None,
            staff_confirmed_at: None,
            staff_confirmation_note: None,
            created_at: now,
            version: 1,
        }
    }

    pub fn effective_claim(&self) -> EffectiveClaim {
        match &self.modification {
            Some(m) => EffectiveClaim {
                exception_type: m.exception_type,
                description: m.description.clone(),
                interval: m.interval,
            },
            None => EffectiveClaim {
                exception_type: self.exception_type,
                description: self.description.clone(),
                interval: self.interval,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn interval(h1: u32, h2: u32) -> TimeInterval {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        TimeInterval::new(
            day.and_hms_opt(h1, 0, 0).unwrap(),
            day.and_hms_opt(h2, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn effective_claim_prefers_the_override_as_a_unit() {
        let mut report = ExceptionReport::new(
            1,
            10,
            100,
            ExceptionType::Rework,
            "solder rework".into(),
            interval(8, 12),
            Utc::now(),
        );

        let claim = report.effective_claim();
        assert_eq!(claim.exception_type, ExceptionType::Rework);
        assert_eq!(claim.interval, interval(8, 12));

        report.modification = Some(ClaimOverride {
            exception_type: ExceptionType::MissingMaterial,
            description: "actually a stock-out".into(),
            interval: interval(9, 11),
        });

        let claim = report.effective_claim();
        assert_eq!(claim.exception_type, ExceptionType::MissingMaterial);
        assert_eq!(claim.description, "actually a stock-out");
        assert_eq!(claim.interval, interval(9, 11));
    }

    #[test]
    fn status_string_form_is_snake_case() {
        assert_eq!(
            ExceptionStatus::PendingSecondApproval.to_string(),
            "pending_second_approval"
        );
        assert_eq!(
            "staff_confirmed".parse::<ExceptionStatus>().unwrap(),
            ExceptionStatus::StaffConfirmed
        );
    }
}
