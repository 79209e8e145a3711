//! Versioned project rows (relational view).
//!
//! Each row is one version of an employee's project. Rows are append-only:
//! a version is closed by setting `valid_to` and clearing `is_current`, and
//! is never touched again after that.
//!
//! Timestamps are stored as INTEGER microseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::employee::Project;

/// `9999-12-31T23:59:59.999999Z` in epoch microseconds; `valid_to` of open rows.
pub const VALID_TO_INFINITY_MICROS: i64 = 253_402_300_799_999_999;

/// The far-future sentinel used as `valid_to` for current rows.
#[must_use]
pub fn valid_to_infinity() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(VALID_TO_INFINITY_MICROS).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Convert a timestamp to storage form.
#[must_use]
pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Convert a stored timestamp back; `None` if out of chrono's range.
#[must_use]
pub fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
}

/// One version of an employee's project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectVersion {
    /// Database row id (0 for versions not yet written)
    pub row_id: i64,
    pub employee_phone: String,
    pub project_id: i64,
    pub name: String,
    pub budget: f64,
    pub status: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_current: bool,
}

impl ProjectVersion {
    /// Open a new current version of `project` starting at `at`.
    #[must_use]
    pub fn open(phone: &str, project: &Project, at: DateTime<Utc>) -> Self {
        Self {
            row_id: 0,
            employee_phone: phone.to_string(),
            project_id: project.id,
            name: project.name.clone(),
            budget: project.budget,
            status: project.status.clone(),
            valid_from: at,
            valid_to: valid_to_infinity(),
            is_current: true,
        }
    }

    /// Document view of this version.
    #[must_use]
    pub fn to_project(&self) -> Project {
        Project::new(self.project_id, self.name.clone(), self.budget, self.status.clone())
    }

    /// Whether `[valid_from, valid_to)` of two versions intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.valid_from < other.valid_to && other.valid_from < self.valid_to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Timelike};

    #[test]
    fn test_infinity_sentinel() {
        let inf = valid_to_infinity();
        assert_eq!(inf.year(), 9999);
        assert_eq!(inf.month(), 12);
        assert_eq!(inf.day(), 31);
        assert_eq!(inf.nanosecond(), 999_999_000);
        assert_eq!(to_micros(inf), VALID_TO_INFINITY_MICROS);
    }

    #[test]
    fn test_micros_round_trip() {
        let now = from_micros(to_micros(Utc::now())).unwrap();
        assert_eq!(from_micros(to_micros(now)), Some(now));
    }

    #[test]
    fn test_half_open_ranges_do_not_overlap_at_boundary() {
        let t0 = from_micros(1_000_000).unwrap();
        let t1 = t0 + Duration::seconds(10);
        let project = Project::new(1, "A", 1.0, "ongoing");

        let mut first = ProjectVersion::open("111", &project, t0);
        first.valid_to = t1;
        first.is_current = false;
        let second = ProjectVersion::open("111", &project, t1);

        assert!(!first.overlaps(&second));

        let mut third = ProjectVersion::open("111", &project, t0 + Duration::seconds(5));
        third.valid_to = t1 + Duration::seconds(5);
        assert!(first.overlaps(&third));
    }
}
