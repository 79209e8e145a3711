//! Employee and project models (document view).
//!
//! These are the shapes stored in the JSON document mirror. The document
//! holds a single snapshot per employee; history lives in the relational
//! store (see [`super::version`]).
//!
//! Keys beyond the known fields are kept in `extra` on every level, so a
//! rewrite of the mirror never drops data it did not understand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a project that is still being worked on.
pub const STATUS_ONGOING: &str = "ongoing";

/// Status given to a project when it is superseded.
pub const STATUS_COMPLETED: &str = "completed";

/// A project assignment as it appears in the document.
///
/// Equality is structural over every field, extras included. Budgets
/// compare by numeric value, so `1000` and `1000.0` in the source JSON are
/// the same project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier, unique per employee lineage
    pub id: i64,

    /// Display name
    pub name: String,

    /// Budget amount
    pub budget: f64,

    /// Free-form status ("ongoing", "completed", ...)
    pub status: String,

    /// Unrecognized keys, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical, hashable form of a [`Project`] in field order
/// (id, name, budget, status, then extras sorted by key).
///
/// `f64` is neither `Eq` nor `Hash`, so the budget is carried as its bit
/// pattern with `-0.0` folded into `0.0`. Extra values are carried as their
/// compact JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectKey<'a> {
    pub id: i64,
    pub name: &'a str,
    pub budget_bits: u64,
    pub status: &'a str,
    pub extra: Vec<(&'a str, String)>,
}

impl Project {
    /// Create a project with the given fields and no extras.
    pub fn new(id: i64, name: impl Into<String>, budget: f64, status: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            budget,
            status: status.into(),
            extra: Map::new(),
        }
    }

    /// Canonical key for structural equality checks.
    #[must_use]
    pub fn key(&self) -> ProjectKey<'_> {
        let budget = if self.budget == 0.0 { 0.0 } else { self.budget };
        let mut extra: Vec<(&str, String)> = self
            .extra
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_string()))
            .collect();
        extra.sort_unstable();
        ProjectKey {
            id: self.id,
            name: &self.name,
            budget_bits: budget.to_bits(),
            status: &self.status,
            extra,
        }
    }

    /// Whether this project has been retired.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// An employee with their project list.
///
/// `phone` is the identity key shared with the relational store and is
/// never changed once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub phone: String,
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Employee {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, projects: Vec<Project>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            projects,
            extra: Map::new(),
        }
    }
}

/// The full document mirror: `{"employees": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDocument {
    pub employees: Vec<Employee>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmployeeDocument {
    #[must_use]
    pub fn new(employees: Vec<Employee>) -> Self {
        Self {
            employees,
            extra: Map::new(),
        }
    }

    /// Find an employee by phone.
    #[must_use]
    pub fn find(&self, phone: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.phone == phone)
    }

    /// Find an employee by phone for mutation.
    pub fn find_mut(&mut self, phone: &str) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|e| e.phone == phone)
    }

    /// Total number of project entries across all employees.
    #[must_use]
    pub fn project_count(&self) -> usize {
        self.employees.iter().map(|e| e.projects.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_structural_equality() {
        let a = Project::new(1, "Alpha", 1000.0, STATUS_ONGOING);
        let b = Project::new(1, "Alpha", 1000.0, STATUS_ONGOING);
        let c = Project::new(1, "Alpha", 1500.0, STATUS_ONGOING);

        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_key_folds_negative_zero() {
        let a = Project::new(7, "Zero", 0.0, "ongoing");
        let b = Project::new(7, "Zero", -0.0, "ongoing");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_integer_and_float_budgets_are_equal() {
        let from_int: Project =
            serde_json::from_str(r#"{"id":1,"name":"A","budget":1000,"status":"ongoing"}"#)
                .unwrap();
        let from_float: Project =
            serde_json::from_str(r#"{"id":1,"name":"A","budget":1000.0,"status":"ongoing"}"#)
                .unwrap();
        assert_eq!(from_int, from_float);
    }

    #[test]
    fn test_find_by_phone() {
        let doc = EmployeeDocument::new(vec![Employee::new(
            "Alice",
            "111",
            vec![Project::new(1, "Alpha", 1000.0, STATUS_ONGOING)],
        )]);

        assert_eq!(doc.find("111").map(|e| e.name.as_str()), Some("Alice"));
        assert!(doc.find("222").is_none());
        assert_eq!(doc.project_count(), 1);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = r#"{"version":2,"employees":[{"name":"Alice","phone":"111","department":"R&D",
            "projects":[{"id":1,"name":"A","budget":1,"status":"ongoing","owner":"x"}]}]}"#;
        let doc: EmployeeDocument = serde_json::from_str(raw).unwrap();

        assert_eq!(doc.extra["version"], 2);
        assert_eq!(doc.employees[0].extra["department"], "R&D");
        assert_eq!(doc.employees[0].projects[0].extra["owner"], "x");

        let back: EmployeeDocument =
            serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_key_includes_extras_in_sorted_order() {
        let mut a = Project::new(1, "Alpha", 1.0, STATUS_ONGOING);
        a.extra.insert("owner".into(), "x".into());
        a.extra.insert("area".into(), "north".into());
        let mut b = Project::new(1, "Alpha", 1.0, STATUS_ONGOING);
        b.extra.insert("area".into(), "north".into());
        b.extra.insert("owner".into(), "x".into());
        let plain = Project::new(1, "Alpha", 1.0, STATUS_ONGOING);

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), plain.key());
    }
}
