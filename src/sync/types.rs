//! Sync record and report types.

use serde::{Deserialize, Serialize};

use crate::model::{Project, ProjectVersion};
use crate::reconcile::ReconcilePlan;

/// One exported history row with sync metadata.
///
/// In the JSONL file the version's fields sit at the top level next to the
/// metadata: `{"row_id":1,"employee_phone":"111",...,"content_hash":"…"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    /// The version data.
    #[serde(flatten)]
    pub data: ProjectVersion,
    /// SHA256 hash of the serialized data (for change detection).
    pub content_hash: String,
    /// ISO8601 timestamp when this record was exported.
    pub exported_at: String,
}

/// Statistics for a history export.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExportStats {
    /// Number of distinct employees with at least one version.
    pub employees: usize,
    /// Number of version rows written.
    pub versions: usize,
    /// Number of those rows that are current.
    pub current: usize,
    /// Rows that are new or differ from the previous export.
    pub changed: usize,
}

impl ExportStats {
    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions == 0
    }
}

/// Outcome of one employee sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub phone: String,
    /// Whether the employee row was created by this sync.
    pub employee_created: bool,
    /// Incoming projects whose id was new for this employee.
    pub inserted: usize,
    /// Incoming projects whose id the employee already had.
    pub updated: usize,
    /// Version rows opened.
    pub opened: usize,
    /// Version rows closed (including retirements).
    pub closed: usize,
    /// Version rows closed with status rewritten to "completed".
    pub retired: usize,
    /// The employee's mirror project list after the merge.
    pub mirror_projects: Vec<Project>,
    /// False when nothing was written (dry run).
    pub applied: bool,
    /// The plan that was (or would be) applied.
    pub plan: ReconcilePlan,
}

/// Totals over a multi-employee batch.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchStats {
    pub employees: usize,
    pub employees_created: usize,
    pub inserted: usize,
    pub updated: usize,
    pub opened: usize,
    pub closed: usize,
    pub retired: usize,
}

impl BatchStats {
    /// Fold one employee's report into the totals.
    pub fn add(&mut self, report: &SyncReport) {
        self.employees += 1;
        self.employees_created += usize::from(report.employee_created);
        self.inserted += report.inserted;
        self.updated += report.updated;
        self.opened += report.opened;
        self.closed += report.closed;
        self.retired += report.retired;
    }
}
