//! Document-mirror merge and deduplication.
//!
//! The mirror keeps one flat project list per employee. Merging a batch:
//! 1. Every existing entry whose id differs from the *last* incoming id is
//!    marked "completed"
//! 2. The incoming entries are appended
//! 3. Exact duplicates are dropped, keeping the first occurrence

use std::collections::HashSet;

use crate::model::{Project, STATUS_COMPLETED};

/// Remove structurally identical projects, preserving first-seen order.
#[must_use]
pub fn dedup_projects(projects: Vec<Project>) -> Vec<Project> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(projects.len());
        projects.iter().map(|p| seen.insert(p.key())).collect()
    };

    projects
        .into_iter()
        .zip(keep)
        .filter_map(|(project, first)| first.then_some(project))
        .collect()
}

/// Mark every project whose id is not `keep_id` as completed.
///
/// Returns how many entries changed status.
pub fn retire_all_except(projects: &mut [Project], keep_id: i64) -> usize {
    let mut changed = 0;
    for project in projects.iter_mut().filter(|p| p.id != keep_id) {
        if !project.is_completed() {
            project.status = STATUS_COMPLETED.to_string();
            changed += 1;
        }
    }
    changed
}

/// Merge `incoming` into an employee's mirror list.
///
/// An empty batch returns the list unchanged.
#[must_use]
pub fn merge_projects(existing: Vec<Project>, incoming: &[Project]) -> Vec<Project> {
    let Some(last) = incoming.last() else {
        return existing;
    };

    let mut merged = existing;
    retire_all_except(&mut merged, last.id);
    merged.extend_from_slice(incoming);
    dedup_projects(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::STATUS_ONGOING;

    fn p(id: i64, budget: f64, status: &str) -> Project {
        Project::new(id, format!("Project {id}"), budget, status)
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let list = vec![
            p(2, 1.0, STATUS_ONGOING),
            p(1, 1.0, STATUS_ONGOING),
            p(2, 1.0, STATUS_ONGOING),
            p(3, 1.0, STATUS_ONGOING),
            p(1, 1.0, STATUS_ONGOING),
        ];
        let ids: Vec<i64> = dedup_projects(list).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_dedup_keeps_entries_differing_in_one_field() {
        let list = vec![
            p(1, 1000.0, STATUS_ONGOING),
            p(1, 1500.0, STATUS_ONGOING),
            p(1, 1000.0, STATUS_COMPLETED),
        ];
        assert_eq!(dedup_projects(list).len(), 3);
    }

    #[test]
    fn test_dedup_keeps_entries_differing_in_unknown_fields() {
        let mut owned = p(1, 1000.0, STATUS_ONGOING);
        owned.extra.insert("owner".to_string(), serde_json::json!("x"));
        let list = vec![owned.clone(), p(1, 1000.0, STATUS_ONGOING), owned];
        assert_eq!(dedup_projects(list).len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let list = vec![
            p(1, 1.0, STATUS_ONGOING),
            p(1, 1.0, STATUS_ONGOING),
            p(2, 2.0, STATUS_COMPLETED),
            p(2, 2.0, STATUS_COMPLETED),
            p(3, 3.0, STATUS_ONGOING),
        ];
        let once = dedup_projects(list);
        let twice = dedup_projects(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_new_project_retires_others() {
        let existing = vec![p(1, 1000.0, STATUS_ONGOING)];
        let merged = merge_projects(existing, &[p(2, 2000.0, STATUS_ONGOING)]);

        assert_eq!(merged, vec![p(1, 1000.0, STATUS_COMPLETED), p(2, 2000.0, STATUS_ONGOING)]);
    }

    #[test]
    fn test_merge_duplicate_leaves_count_unchanged() {
        let existing = vec![p(1, 1000.0, STATUS_COMPLETED), p(2, 2000.0, STATUS_ONGOING)];
        let merged = merge_projects(existing.clone(), &[p(2, 2000.0, STATUS_ONGOING)]);
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_merge_update_keeps_previous_entry() {
        let existing = vec![p(1, 1000.0, STATUS_COMPLETED), p(2, 2000.0, STATUS_ONGOING)];
        let merged = merge_projects(existing, &[p(1, 1500.0, STATUS_ONGOING)]);

        assert_eq!(
            merged,
            vec![
                p(1, 1000.0, STATUS_COMPLETED),
                p(2, 2000.0, STATUS_COMPLETED),
                p(1, 1500.0, STATUS_ONGOING),
            ]
        );
    }

    #[test]
    fn test_merge_only_rewrites_existing_entries() {
        // Earlier entries of the same batch are appended as given.
        let merged = merge_projects(Vec::new(), &[p(1, 1.0, STATUS_ONGOING), p(2, 2.0, STATUS_ONGOING)]);
        assert_eq!(merged, vec![p(1, 1.0, STATUS_ONGOING), p(2, 2.0, STATUS_ONGOING)]);
    }

    #[test]
    fn test_merge_empty_batch_is_noop() {
        let existing = vec![p(1, 1.0, STATUS_ONGOING), p(1, 1.0, STATUS_ONGOING)];
        assert_eq!(merge_projects(existing.clone(), &[]), existing);
    }

    #[test]
    fn test_retire_all_except_counts_changes() {
        let mut list = vec![p(1, 1.0, STATUS_ONGOING), p(2, 1.0, STATUS_COMPLETED), p(3, 1.0, STATUS_ONGOING)];
        assert_eq!(retire_all_except(&mut list, 3), 1);
        assert_eq!(list[2].status, STATUS_ONGOING);
    }
}
