use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::model::attendance::DailyAttendanceRecord;
use crate::model::exception::{ExceptionReport, ExceptionStatus};
use crate::model::interval::TimeInterval;

/// List filter for exception reports.
#[derive(Debug, Default, Clone)]
pub struct ReportFilter {
    pub status: Option<ExceptionStatus>,
    pub worker_id: Option<u64>,
    pub task_id: Option<u64>,
}

/// In-memory persistence collaborator. Every record lives behind its own
/// mutex, giving the at-most-one-writer-per-id discipline the workflow
/// requires; the outer maps are only locked long enough to hand out a record
/// handle. Reconciliation reads run freely in parallel across records.
pub struct Store {
    report_seq: AtomicU64,
    reports: RwLock<HashMap<u64, Arc<Mutex<ExceptionReport>>>>,
    attendance: RwLock<HashMap<(u64, NaiveDate), Arc<Mutex<DailyAttendanceRecord>>>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            report_seq: AtomicU64::new(1),
            reports: RwLock::new(HashMap::new()),
            attendance: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_report(
        &self,
        build: impl FnOnce(u64) -> ExceptionReport,
    ) -> ExceptionReport {
        let id = self.report_seq.fetch_add(1, Ordering::Relaxed);
        let report = build(id);
        self.reports
            .write()
            .expect("report map lock poisoned")
            .insert(id, Arc::new(Mutex::new(report.clone())));
        report
    }

    fn report_handle(&self, id: u64) -> Result<Arc<Mutex<ExceptionReport>>, CoreError> {
        self.reports
            .read()
            .expect("report map lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("exception report"))
    }

    pub fn get_report(&self, id: u64) -> Result<ExceptionReport, CoreError> {
        let handle = self.report_handle(id)?;
        let guard = handle.lock().expect("report lock poisoned");
        Ok(guard.clone())
    }

    /// Read-modify-write under the record lock. The current version is
    /// re-validated against `expected_version` when the caller supplies one
    /// (optimistic check); the mutation runs on a draft so a failing
    /// transition leaves the stored report untouched.
    pub fn update_report(
        &self,
        id: u64,
        expected_version: Option<u64>,
        mutate: impl FnOnce(&mut ExceptionReport) -> Result<(), CoreError>,
    ) -> Result<ExceptionReport, CoreError> {
        let handle = self.report_handle(id)?;
        let mut guard = handle.lock().expect("report lock poisoned");
        if let Some(expected) = expected_version {
            if guard.version != expected {
                return Err(CoreError::StaleState);
            }
        }
        let mut draft = guard.clone();
        mutate(&mut draft)?;
        draft.version = guard.version + 1;
        *guard = draft.clone();
        Ok(draft)
    }

    /// Matching reports, newest first.
    pub fn list_reports(&self, filter: &ReportFilter) -> Vec<ExceptionReport> {
        let handles: Vec<Arc<Mutex<ExceptionReport>>> = self
            .reports
            .read()
            .expect("report map lock poisoned")
            .values()
            .cloned()
            .collect();

        let mut reports: Vec<ExceptionReport> = handles
            .iter()
            .map(|h| h.lock().expect("report lock poisoned").clone())
            .filter(|r| {
                filter.status.is_none_or(|s| r.status == s)
                    && filter.worker_id.is_none_or(|w| r.worker_id == w)
                    && filter.task_id.is_none_or(|t| r.task_id == t)
            })
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reports
    }

    /// Effective intervals of resolved exceptions for `worker_id` touching
    /// `date` — the reconciliation engine's exception input for that day.
    pub fn resolved_claims_for(&self, worker_id: u64, date: NaiveDate) -> Vec<TimeInterval> {
        self.list_reports(&ReportFilter {
            worker_id: Some(worker_id),
            ..ReportFilter::default()
        })
        .into_iter()
        .filter(|r| r.status.is_resolved())
        .map(|r| r.effective_claim().interval)
        .filter(|claim| claim.clip_to_day(date).is_some())
        .collect()
    }

    fn attendance_handle(
        &self,
        worker_id: u64,
        date: NaiveDate,
        standard_hours: f64,
    ) -> Arc<Mutex<DailyAttendanceRecord>> {
        // Created implicitly the first time the day is touched.
        self.attendance
            .write()
            .expect("attendance map lock poisoned")
            .entry((worker_id, date))
            .or_insert_with(|| {
                Arc::new(Mutex::new(DailyAttendanceRecord::new(
                    worker_id,
                    date,
                    standard_hours,
                )))
            })
            .clone()
    }

    pub fn attendance_record(
        &self,
        worker_id: u64,
        date: NaiveDate,
    ) -> Option<DailyAttendanceRecord> {
        let handle = self
            .attendance
            .read()
            .expect("attendance map lock poisoned")
            .get(&(worker_id, date))
            .cloned()?;
        let guard = handle.lock().expect("attendance lock poisoned");
        Some(guard.clone())
    }

    /// Serialized access to one (worker, date) record, creating it with
    /// `standard_hours` if it does not exist yet. Callers that make an
    /// actual adjustment (as opposed to recomputing derived fields) bump the
    /// record version themselves.
    pub fn with_attendance<T>(
        &self,
        worker_id: u64,
        date: NaiveDate,
        standard_hours: f64,
        f: impl FnOnce(&mut DailyAttendanceRecord) -> T,
    ) -> T {
        let handle = self.attendance_handle(worker_id, date, standard_hours);
        let mut guard = handle.lock().expect("attendance lock poisoned");
        f(&mut guard)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::exception::ExceptionType;
    use chrono::Utc;

    fn interval(day: u32, h1: u32, h2: u32) -> TimeInterval {
        let d = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        TimeInterval::new(
            d.and_hms_opt(h1, 0, 0).unwrap(),
            d.and_hms_opt(h2, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn submit(store: &Store, worker_id: u64) -> ExceptionReport {
        store.insert_report(|id| {
            ExceptionReport::new(
                id,
                10,
                worker_id,
                ExceptionType::Rework,
                "rework".into(),
                interval(2, 9, 11),
                Utc::now(),
            )
        })
    }

    #[test]
    fn version_mismatch_fails_with_stale_state() {
        let store = Store::new();
        let report = submit(&store, 100);
        assert_eq!(report.version, 1);

        let err = store
            .update_report(report.id, Some(99), |_| Ok(()))
            .unwrap_err();
        assert_eq!(err, CoreError::StaleState);

        let updated = store
            .update_report(report.id, Some(1), |r| {
                r.description = "edited".into();
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn failed_mutation_leaves_the_stored_report_unchanged() {
        let store = Store::new();
        let report = submit(&store, 100);

        let err = store
            .update_report(report.id, None, |r| {
                r.description = "half applied".into();
                Err(CoreError::InvalidTransition("nope".into()))
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));

        let stored = store.get_report(report.id).unwrap();
        assert_eq!(stored.description, "rework");
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn resolved_claims_are_scoped_to_worker_day_and_resolution() {
        let store = Store::new();
        let a = submit(&store, 100);
        let _other_worker = submit(&store, 101);
        let _unresolved = submit(&store, 100);

        store
            .update_report(a.id, None, |r| {
                r.status = ExceptionStatus::Approved;
                Ok(())
            })
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(store.resolved_claims_for(100, day), vec![interval(2, 9, 11)]);
        let other_day = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert!(store.resolved_claims_for(100, other_day).is_empty());
    }

    #[test]
    fn attendance_record_is_created_implicitly_on_first_touch() {
        let store = Store::new();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(store.attendance_record(100, day).is_none());

        store.with_attendance(100, day, 8.0, |r| {
            assert_eq!(r.standard_hours, 8.0);
        });
        assert!(store.attendance_record(100, day).is_some());
    }
}
