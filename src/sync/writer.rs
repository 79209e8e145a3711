//! Dual-store writer.
//!
//! One sync call for one employee:
//! 1. In one IMMEDIATE transaction: ensure the employee row, read the
//!    employee's timeline, reconcile, apply the plan, commit.
//! 2. Only after the commit: merge the batch into the document mirror and
//!    rewrite it.
//!
//! If step 1 fails nothing is written anywhere. If step 2 fails the error is
//! returned, but the relational commit stands.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Employee, EmployeeDocument, Project, ProjectVersion};
use crate::reconcile::{Decision, ReconcilePlan, reconcile};
use crate::storage::SqliteStorage;
use crate::storage::sqlite::{apply_plan, ensure_employee, project_history};
use crate::sync::file::DocumentStore;
use crate::sync::merge::merge_projects;
use crate::sync::types::SyncReport;

/// Applies employee batches to the relational store and the mirror.
pub struct SyncWriter<'a> {
    storage: &'a mut SqliteStorage,
    document: &'a DocumentStore,
}

impl<'a> SyncWriter<'a> {
    #[must_use]
    pub fn new(storage: &'a mut SqliteStorage, document: &'a DocumentStore) -> Self {
        Self { storage, document }
    }

    #[must_use]
    pub fn document(&self) -> &DocumentStore {
        self.document
    }

    /// Sync one employee's incoming projects into both stores.
    ///
    /// # Errors
    ///
    /// Returns a database error (the transaction is rolled back and the
    /// mirror untouched), or a mirror error after the commit.
    pub fn sync_employee(&mut self, name: &str, phone: &str, projects: &[Project]) -> Result<SyncReport> {
        self.sync_employee_at(name, phone, projects, Utc::now())
    }

    /// [`Self::sync_employee`] with an explicit reconciliation instant.
    ///
    /// # Errors
    ///
    /// See [`Self::sync_employee`].
    pub fn sync_employee_at(
        &mut self,
        name: &str,
        phone: &str,
        projects: &[Project],
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let (employee_created, plan) = self.storage.mutate("sync_employee", |tx| {
            let created = ensure_employee(tx, name, phone, now)?;
            let existing = project_history(tx, phone)?;
            let plan = reconcile(phone, &existing, projects, now);
            apply_plan(tx, &plan, now)?;
            Ok((created, plan))
        })?;

        info!(
            phone,
            opened = plan.opened(),
            closed = plan.closed(),
            retired = plan.retired(),
            "Committed history"
        );

        let mut mirror = self.load_mirror()?;
        let mirror_projects = if projects.is_empty() {
            mirror.find(phone).map(|e| e.projects.clone()).unwrap_or_default()
        } else {
            let merged = merge_into(&mut mirror, name, phone, projects);
            self.document.save(&mirror)?;
            merged
        };

        Ok(report(phone, employee_created, plan, mirror_projects, true))
    }

    /// Compute what [`Self::sync_employee`] would do without writing.
    ///
    /// # Errors
    ///
    /// Returns an error if reading either store fails.
    pub fn preview(&self, name: &str, phone: &str, projects: &[Project]) -> Result<SyncReport> {
        let mut overlay = PreviewOverlay::new(self.load_mirror()?);
        self.preview_in(&mut overlay, name, phone, projects)
    }

    /// Preview against `overlay`, then fold the result into it so the next
    /// preview of the same batch sees this one's effects.
    fn preview_in(
        &self,
        overlay: &mut PreviewOverlay,
        name: &str,
        phone: &str,
        projects: &[Project],
    ) -> Result<SyncReport> {
        let now = Utc::now();
        let employee_created = !overlay.ensured.contains(phone) && self.storage.get_employee(phone)?.is_none();
        overlay.ensured.insert(phone.to_string());

        let rows = match overlay.rows.entry(phone.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.storage.project_history(phone)?),
        };
        let plan = reconcile(phone, rows, projects, now);
        plan.apply_to(rows);

        let mirror_projects = if projects.is_empty() {
            overlay.mirror.find(phone).map(|e| e.projects.clone()).unwrap_or_default()
        } else {
            merge_into(&mut overlay.mirror, name, phone, projects)
        };

        debug!(phone, ops = plan.ops.len(), "Previewed sync");
        Ok(report(phone, employee_created, plan, mirror_projects, false))
    }

    /// Sync every employee of a validated batch document, in order.
    ///
    /// Each employee is its own transaction; the first failure stops the
    /// batch and earlier employees stay committed. A dry run previews each
    /// entry on top of the entries before it, so a phone listed twice
    /// reports what the real run would do.
    ///
    /// # Errors
    ///
    /// Returns the first employee's failure.
    pub fn sync_document(&mut self, batch: &EmployeeDocument, dry_run: bool) -> Result<Vec<SyncReport>> {
        let mut reports = Vec::with_capacity(batch.employees.len());
        if dry_run {
            let mut overlay = PreviewOverlay::new(self.load_mirror()?);
            for employee in &batch.employees {
                reports.push(self.preview_in(&mut overlay, &employee.name, &employee.phone, &employee.projects)?);
            }
        } else {
            for employee in &batch.employees {
                reports.push(self.sync_employee(&employee.name, &employee.phone, &employee.projects)?);
            }
        }
        Ok(reports)
    }

    /// The mirror, or an empty one if the file does not exist yet.
    fn load_mirror(&self) -> Result<EmployeeDocument> {
        if self.document.exists() {
            self.document.load()
        } else {
            Ok(EmployeeDocument::default())
        }
    }
}

/// In-memory state a dry run accumulates instead of writing.
struct PreviewOverlay {
    /// Timelines read so far, with earlier previewed plans applied
    rows: HashMap<String, Vec<ProjectVersion>>,
    /// Phones an earlier preview already "created"
    ensured: HashSet<String>,
    mirror: EmployeeDocument,
}

impl PreviewOverlay {
    fn new(mirror: EmployeeDocument) -> Self {
        Self {
            rows: HashMap::new(),
            ensured: HashSet::new(),
            mirror,
        }
    }
}

/// Merge a batch into the employee's mirror entry, appending the employee if
/// absent. Returns the employee's resulting project list.
fn merge_into(mirror: &mut EmployeeDocument, name: &str, phone: &str, projects: &[Project]) -> Vec<Project> {
    if let Some(employee) = mirror.find_mut(phone) {
        employee.projects = merge_projects(std::mem::take(&mut employee.projects), projects);
        return employee.projects.clone();
    }

    let merged = merge_projects(Vec::new(), projects);
    mirror.employees.push(Employee::new(name, phone, merged.clone()));
    merged
}

fn report(
    phone: &str,
    employee_created: bool,
    plan: ReconcilePlan,
    mirror_projects: Vec<Project>,
    applied: bool,
) -> SyncReport {
    SyncReport {
        phone: phone.to_string(),
        employee_created,
        inserted: plan.count(Decision::Insert),
        updated: plan.count(Decision::Update),
        opened: plan.opened(),
        closed: plan.closed(),
        retired: plan.retired(),
        mirror_projects,
        applied,
        plan,
    }
}

/// Name of the mirror employee with this phone.
///
/// # Errors
///
/// Returns [`Error::EmployeeNotFound`] if the phone is not in the mirror, or
/// an error if the mirror cannot be loaded.
pub fn mirror_employee_name(document: &DocumentStore, phone: &str) -> Result<String> {
    document
        .load()?
        .find(phone)
        .map(|e| e.name.clone())
        .ok_or_else(|| Error::EmployeeNotFound {
            phone: phone.to_string(),
        })
}

/// Add one project to an employee known to the mirror and persist it to both
/// stores.
///
/// `target_status_hint` is accepted for callers that pass one; it is logged
/// and has no effect.
///
/// # Errors
///
/// Returns [`Error::EmployeeNotFound`] if the phone is unknown (nothing is
/// written), or any sync error.
pub fn add_project(
    writer: &mut SyncWriter<'_>,
    phone: &str,
    target_status_hint: Option<&str>,
    project: Project,
) -> Result<SyncReport> {
    let name = mirror_employee_name(writer.document(), phone)?;
    if let Some(hint) = target_status_hint {
        debug!(phone, hint, "Ignoring target status hint");
    }
    writer.sync_employee(&name, phone, &[project])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProjectVersion, STATUS_COMPLETED, STATUS_ONGOING};
    use chrono::Duration;
    use tempfile::TempDir;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn alpha(budget: f64) -> Project {
        Project::new(1, "Alpha", budget, STATUS_ONGOING)
    }

    fn beta() -> Project {
        Project::new(2, "Beta", 2000.0, STATUS_ONGOING)
    }

    fn setup() -> (TempDir, SqliteStorage, DocumentStore) {
        let temp_dir = TempDir::new().unwrap();
        let storage = SqliteStorage::open_memory().unwrap();
        let document = DocumentStore::new(temp_dir.path().join("employees.json"));
        (temp_dir, storage, document)
    }

    fn row(history: &[ProjectVersion], project_id: i64, current: bool) -> &ProjectVersion {
        history
            .iter()
            .rev()
            .find(|r| r.project_id == project_id && r.is_current == current)
            .unwrap()
    }

    #[test]
    fn test_new_project_supersedes_current() {
        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);

        let first = writer.sync_employee_at("Alice", "111", &[alpha(1000.0)], t(0)).unwrap();
        assert!(first.employee_created);

        let second = writer.sync_employee_at("Alice", "111", &[beta()], t(10)).unwrap();
        assert!(!second.employee_created);
        assert_eq!(second.inserted, 1);
        assert_eq!(second.retired, 1);

        let history = storage.project_history("111").unwrap();
        let old = row(&history, 1, false);
        assert_eq!(old.status, STATUS_COMPLETED);
        assert_eq!(old.valid_to, t(10));
        assert_eq!(row(&history, 2, true).to_project(), beta());

        let mirror = document.load().unwrap();
        let projects = &mirror.find("111").unwrap().projects;
        assert_eq!(
            projects,
            &vec![Project::new(1, "Alpha", 1000.0, STATUS_COMPLETED), beta()]
        );
    }

    #[test]
    fn test_update_does_not_retire_siblings() {
        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);

        writer.sync_employee_at("Alice", "111", &[alpha(1000.0)], t(0)).unwrap();
        writer.sync_employee_at("Alice", "111", &[beta()], t(10)).unwrap();
        let report = writer.sync_employee_at("Alice", "111", &[alpha(1500.0)], t(20)).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.retired, 0);

        let current = storage.current_versions("111").unwrap();
        let ids: Vec<i64> = current.iter().map(|r| r.project_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(current[0].budget, 1500.0);
        assert_eq!(current[0].valid_from, t(20));
    }

    #[test]
    fn test_resaving_identical_project_versions_history_but_not_mirror() {
        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);

        writer.sync_employee_at("Alice", "111", &[alpha(1000.0)], t(0)).unwrap();
        writer.sync_employee_at("Alice", "111", &[beta()], t(10)).unwrap();
        let before = document.load().unwrap().project_count();

        writer.sync_employee_at("Alice", "111", &[beta()], t(20)).unwrap();

        assert_eq!(document.load().unwrap().project_count(), before);
        assert_eq!(storage.project_history("111").unwrap().len(), 3);
    }

    #[test]
    fn test_failed_write_rolls_back_and_skips_mirror() {
        let (_dir, mut storage, document) = setup();
        storage
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_99 BEFORE INSERT ON projects
                 WHEN NEW.project_id = 99
                 BEGIN SELECT RAISE(ABORT, 'project 99 rejected'); END;",
            )
            .unwrap();
        let mut writer = SyncWriter::new(&mut storage, &document);

        let batch = [alpha(1000.0), Project::new(99, "Rejected", 1.0, STATUS_ONGOING)];
        let err = writer.sync_employee_at("Alice", "111", &batch, t(0)).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        assert!(storage.get_employee("111").unwrap().is_none());
        assert!(storage.project_history("111").unwrap().is_empty());
        assert!(!document.exists());
    }

    #[test]
    fn test_empty_batch_ensures_employee_only() {
        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);

        let report = writer.sync_employee_at("Alice", "111", &[], t(0)).unwrap();
        assert!(report.employee_created);
        assert!(report.plan.is_empty());
        assert!(!document.exists());
        assert!(storage.get_employee("111").unwrap().is_some());
    }

    #[test]
    fn test_employee_missing_from_mirror_is_appended() {
        let (_dir, mut storage, document) = setup();
        document.init_empty().unwrap();
        let mut writer = SyncWriter::new(&mut storage, &document);

        writer.sync_employee_at("Bob", "222", &[beta()], t(0)).unwrap();

        let mirror = document.load().unwrap();
        let bob = mirror.find("222").unwrap();
        assert_eq!(bob.name, "Bob");
        assert_eq!(bob.projects, vec![beta()]);
    }

    #[test]
    fn test_preview_writes_nothing() {
        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);
        writer.sync_employee_at("Alice", "111", &[alpha(1000.0)], t(0)).unwrap();
        let mirror_before = document.load().unwrap();

        let report = writer.preview("Alice", "111", &[beta()]).unwrap();
        assert!(!report.applied);
        assert_eq!(report.retired, 1);
        assert_eq!(report.mirror_projects.len(), 2);

        assert_eq!(storage.project_history("111").unwrap().len(), 1);
        assert_eq!(document.load().unwrap(), mirror_before);
    }

    #[test]
    fn test_sync_document_runs_each_employee() {
        let (_dir, mut storage, document) = setup();
        let batch = EmployeeDocument::new(vec![
            Employee::new("Alice", "111", vec![alpha(1000.0)]),
            Employee::new("Bob", "222", vec![beta()]),
        ]);
        let mut writer = SyncWriter::new(&mut storage, &document);

        let reports = writer.sync_document(&batch, false).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(storage.list_employees().unwrap().len(), 2);
        assert_eq!(document.load().unwrap(), batch);
    }

    #[test]
    fn test_dry_run_batch_sees_earlier_entries_for_same_phone() {
        let batch = EmployeeDocument::new(vec![
            Employee::new("Alice", "111", vec![alpha(1000.0)]),
            Employee::new("Alice", "111", vec![beta()]),
        ]);

        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);
        let previewed = writer.sync_document(&batch, true).unwrap();
        assert!(storage.list_employees().unwrap().is_empty());
        assert!(!document.exists());

        let (_real_dir, mut real_storage, real_document) = setup();
        let mut real_writer = SyncWriter::new(&mut real_storage, &real_document);
        let applied = real_writer.sync_document(&batch, false).unwrap();

        assert!(previewed[0].employee_created);
        assert!(!previewed[1].employee_created);
        assert_eq!(previewed[1].retired, 1);
        for (dry, real) in previewed.iter().zip(&applied) {
            assert_eq!(dry.employee_created, real.employee_created);
            assert_eq!(dry.inserted, real.inserted);
            assert_eq!(dry.updated, real.updated);
            assert_eq!(dry.opened, real.opened);
            assert_eq!(dry.closed, real.closed);
            assert_eq!(dry.retired, real.retired);
            assert_eq!(dry.mirror_projects, real.mirror_projects);
        }
    }

    #[test]
    fn test_sync_keeps_unknown_mirror_fields() {
        let (_dir, mut storage, document) = setup();
        std::fs::write(
            document.path(),
            r#"{
                "version": 3,
                "employees": [{
                    "name": "Alice",
                    "phone": "111",
                    "department": "R&D",
                    "projects": [
                        {"id": 1, "name": "Alpha", "budget": 1000, "status": "ongoing", "owner": "x"}
                    ]
                }]
            }"#,
        )
        .unwrap();
        let mut writer = SyncWriter::new(&mut storage, &document);

        writer.sync_employee_at("Alice", "111", &[beta()], t(10)).unwrap();

        let mirror = document.load().unwrap();
        assert_eq!(mirror.extra["version"], 3);
        let alice = mirror.find("111").unwrap();
        assert_eq!(alice.extra["department"], "R&D");
        assert_eq!(alice.projects.len(), 2);
        assert_eq!(alice.projects[0].status, STATUS_COMPLETED);
        assert_eq!(alice.projects[0].extra["owner"], "x");
        assert_eq!(alice.projects[1], beta());
    }

    #[test]
    fn test_add_project_requires_mirror_employee() {
        let (_dir, mut storage, document) = setup();
        document.init_empty().unwrap();
        let mut writer = SyncWriter::new(&mut storage, &document);

        let err = add_project(&mut writer, "999", None, beta()).unwrap_err();
        assert!(matches!(err, Error::EmployeeNotFound { .. }));
        assert!(storage.list_employees().unwrap().is_empty());
    }

    #[test]
    fn test_add_project_ignores_target_status_hint() {
        let (_dir, mut storage, document) = setup();
        let mut writer = SyncWriter::new(&mut storage, &document);
        writer.sync_employee_at("Alice", "111", &[alpha(1000.0)], t(0) - Duration::hours(1)).unwrap();

        let report = add_project(&mut writer, "111", Some("paused"), beta()).unwrap();
        assert_eq!(report.mirror_projects[1].status, STATUS_ONGOING);
        assert_eq!(report.mirror_projects[0].status, STATUS_COMPLETED);
    }
}
