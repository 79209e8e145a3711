//! History reconciliation.
//!
//! Given an employee's existing version rows and a batch of incoming
//! projects, decide which rows close and which open. This module is pure:
//! it reads its inputs and returns a [`ReconcilePlan`], and the
//! [`crate::sync::SyncWriter`] applies the plan inside a transaction.
//!
//! # Rules
//!
//! For each incoming project, in order:
//!
//! - **Known id** (the employee has any row for it): close that id's current
//!   row, if one is open, then open a new current version with the incoming
//!   fields. Sibling projects stay open. Re-saving identical fields still
//!   produces a new version.
//! - **New id**: close every open row of the employee with
//!   `status = "completed"`, then open the new project.
//!
//! The asymmetry is deliberate: one active project lineage per employee is
//! enforced only when a new lineage starts.
//!
//! # Instants
//!
//! Each step happens at `max(now, last valid_from + 1µs)`, truncated to
//! microseconds, so versions of an employee never share a `valid_from` and
//! ranges never overlap, even when a batch touches the same id twice.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;

use crate::model::{Project, ProjectVersion, STATUS_COMPLETED};

/// One operation of a reconciliation plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HistoryOp {
    /// Close the current row identified by `(project_id, valid_from)`.
    Close {
        project_id: i64,
        valid_from: DateTime<Utc>,
        closed_at: DateTime<Utc>,
        /// Also rewrite `status` to "completed" (new-id branch only).
        retire: bool,
    },
    /// Insert a new current row.
    Open(ProjectVersion),
}

/// Which branch an incoming project took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Update,
    Insert,
}

/// The output of [`reconcile`]: ordered operations plus per-project decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcilePlan {
    pub phone: String,
    pub ops: Vec<HistoryOp>,
    pub decisions: Vec<(i64, Decision)>,
}

impl ReconcilePlan {
    /// Number of rows this plan opens.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, HistoryOp::Open(_))).count()
    }

    /// Number of rows this plan closes.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.ops.len() - self.opened()
    }

    /// Number of rows closed as retirements (status rewritten).
    #[must_use]
    pub fn retired(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, HistoryOp::Close { retire: true, .. }))
            .count()
    }

    /// Number of incoming projects that took the given branch.
    #[must_use]
    pub fn count(&self, decision: Decision) -> usize {
        self.decisions.iter().filter(|(_, d)| *d == decision).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Replay this plan over an in-memory row set.
    ///
    /// Used for dry-run previews; the storage layer applies the same
    /// operations with SQL.
    pub fn apply_to(&self, rows: &mut Vec<ProjectVersion>) {
        for op in &self.ops {
            match op {
                HistoryOp::Close {
                    project_id,
                    valid_from,
                    closed_at,
                    retire,
                } => {
                    if let Some(row) = rows.iter_mut().find(|r| {
                        r.is_current && r.project_id == *project_id && r.valid_from == *valid_from
                    }) {
                        close_row(row, *closed_at, *retire);
                    }
                }
                HistoryOp::Open(version) => rows.push(version.clone()),
            }
        }
    }
}

fn close_row(row: &mut ProjectVersion, at: DateTime<Utc>, retire: bool) {
    row.valid_to = at;
    row.is_current = false;
    if retire {
        row.status = STATUS_COMPLETED.to_string();
    }
}

/// Compute the close/open operations for one employee batch.
///
/// `existing` is every version row of the employee (current and historical).
#[must_use]
pub fn reconcile(
    phone: &str,
    existing: &[ProjectVersion],
    incoming: &[Project],
    now: DateTime<Utc>,
) -> ReconcilePlan {
    // Storage keeps microseconds; align so stored and planned instants agree.
    let now = now.trunc_subsecs(6);
    let mut plan = ReconcilePlan {
        phone: phone.to_string(),
        ..ReconcilePlan::default()
    };

    let mut known: HashSet<i64> = existing.iter().map(|r| r.project_id).collect();
    let mut open: Vec<ProjectVersion> = existing.iter().filter(|r| r.is_current).cloned().collect();
    let mut last_from = existing.iter().map(|r| r.valid_from).max();

    for project in incoming {
        let at = match last_from {
            Some(prev) if prev >= now => prev + Duration::microseconds(1),
            _ => now,
        };
        last_from = Some(at);

        if known.contains(&project.id) {
            plan.decisions.push((project.id, Decision::Update));
            if let Some(pos) = open.iter().position(|r| r.project_id == project.id) {
                let row = open.remove(pos);
                plan.ops.push(HistoryOp::Close {
                    project_id: row.project_id,
                    valid_from: row.valid_from,
                    closed_at: at,
                    retire: false,
                });
            }
        } else {
            plan.decisions.push((project.id, Decision::Insert));
            for row in open.drain(..) {
                plan.ops.push(HistoryOp::Close {
                    project_id: row.project_id,
                    valid_from: row.valid_from,
                    closed_at: at,
                    retire: true,
                });
            }
            known.insert(project.id);
        }

        let version = ProjectVersion::open(phone, project, at);
        open.push(version.clone());
        plan.ops.push(HistoryOp::Open(version));
    }

    plan
}
