//! Structural validation of employee documents.
//!
//! Every document entering the reconciler passes through here first. The
//! shape is expressed as JSON Schema and checked with `jsonschema`, then the
//! accepted value is deserialized into typed models. Two failure tiers:
//! malformed JSON → [`Error::Parse`], wrong shape → [`Error::Schema`].

use std::sync::LazyLock;

use jsonschema::JSONSchema;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::model::{EmployeeDocument, Project};

/// Schema for a single project entry.
pub static PROJECT_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "integer"},
            "name": {"type": "string"},
            "budget": {"type": "number"},
            "status": {"type": "string"}
        },
        "required": ["id", "name", "budget", "status"]
    })
});

/// Schema for the whole employee collection.
pub static EMPLOYEE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "employees": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "phone": {"type": "string"},
                        "projects": {
                            "type": "array",
                            "items": PROJECT_SCHEMA.clone()
                        }
                    },
                    "required": ["name", "phone", "projects"]
                }
            }
        },
        "required": ["employees"]
    })
});

/// Largest integer budget magnitude an `f64` holds exactly (2^53).
pub const MAX_EXACT_BUDGET: u64 = 1 << 53;

/// Parse raw text into a JSON value.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is not well-formed JSON.
pub fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::Parse(e.to_string()))
}

/// Check a value against `schema`, collecting every violation.
///
/// Violations are rendered as `<json pointer>: <reason>`; the root is `/`.
///
/// # Errors
///
/// Returns [`Error::Schema`] listing all violations.
pub fn check_schema(schema: &Value, instance: &Value) -> Result<()> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| Error::Other(format!("invalid built-in schema: {e}")))?;

    if let Err(errors) = compiled.validate(instance) {
        let violations: Vec<String> = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("{path}: {e}")
            })
            .collect();
        return Err(Error::Schema { violations });
    }

    Ok(())
}

/// Reject an integer budget that would round when stored as `f64`.
fn check_budget(path: &str, budget: Option<&Value>) -> Result<()> {
    let Some(Value::Number(n)) = budget else {
        return Ok(());
    };
    let magnitude = n.as_u64().or_else(|| n.as_i64().map(i64::unsigned_abs));
    match magnitude {
        Some(m) if m > MAX_EXACT_BUDGET => Err(Error::schema(format!(
            "{path}: {n} is beyond the exactly representable budget range (±{MAX_EXACT_BUDGET})"
        ))),
        _ => Ok(()),
    }
}

/// Validate an already-parsed value and convert it to a typed document.
///
/// # Errors
///
/// Returns [`Error::Schema`] if the value does not match [`EMPLOYEE_SCHEMA`]
/// or an integer budget exceeds [`MAX_EXACT_BUDGET`].
pub fn validate_value(value: Value) -> Result<EmployeeDocument> {
    check_schema(&EMPLOYEE_SCHEMA, &value)?;
    let employees = value["employees"].as_array().map(Vec::as_slice).unwrap_or_default();
    for (i, employee) in employees.iter().enumerate() {
        let projects = employee["projects"].as_array().map(Vec::as_slice).unwrap_or_default();
        for (j, project) in projects.iter().enumerate() {
            check_budget(&format!("/employees/{i}/projects/{j}/budget"), project.get("budget"))?;
        }
    }
    // The schema admits integral floats such as `1.0` for `id`; those still
    // fail typed conversion, which is a shape problem too.
    serde_json::from_value(value).map_err(|e| Error::schema(e.to_string()))
}

/// Validate raw document text.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed JSON and [`Error::Schema`] for
/// structural violations.
pub fn validate_document(raw: &str) -> Result<EmployeeDocument> {
    validate_value(parse_json(raw)?)
}

/// Validate a single project value.
///
/// # Errors
///
/// Returns [`Error::Schema`] if the value does not match [`PROJECT_SCHEMA`]
/// or an integer budget exceeds [`MAX_EXACT_BUDGET`].
pub fn validate_project(value: Value) -> Result<Project> {
    check_schema(&PROJECT_SCHEMA, &value)?;
    check_budget("/budget", value.get("budget"))?;
    serde_json::from_value(value).map_err(|e| Error::schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = r#"{
        "employees": [
            {
                "name": "Alice",
                "phone": "111",
                "projects": [
                    {"id": 1, "name": "Alpha", "budget": 1000, "status": "ongoing"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_valid_document() {
        let doc = validate_document(ALICE).unwrap();
        assert_eq!(doc.employees.len(), 1);
        assert_eq!(doc.employees[0].projects[0].budget, 1000.0);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = validate_document(r#"{"employees": ["#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_missing_employees_is_schema_error() {
        let err = validate_document(r#"{"staff": []}"#).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_top_level_array_is_schema_error() {
        let err = validate_document("[]").unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_missing_phone_names_location() {
        let err = validate_document(
            r#"{"employees": [{"name": "Bob", "projects": []}]}"#,
        )
        .unwrap_err();

        match err {
            Error::Schema { violations } => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].starts_with("/employees/0"));
                assert!(violations[0].contains("phone"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_mistyped_project_fields() {
        let err = validate_document(
            r#"{"employees": [{"name": "Bob", "phone": "2", "projects": [
                {"id": "one", "name": "A", "budget": "lots", "status": "ongoing"}
            ]}]}"#,
        )
        .unwrap_err();

        match err {
            Error::Schema { violations } => {
                assert_eq!(violations.len(), 2);
                assert!(violations.iter().any(|v| v.starts_with("/employees/0/projects/0/id")));
                assert!(violations.iter().any(|v| v.starts_with("/employees/0/projects/0/budget")));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_fractional_id_rejected() {
        let err = validate_project(json!({"id": 1.5, "name": "A", "budget": 1, "status": "x"}))
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_validate_single_project() {
        let project =
            validate_project(json!({"id": 6, "name": "Delta", "budget": 3000, "status": "ongoing"}))
                .unwrap();
        assert_eq!(project, Project::new(6, "Delta", 3000.0, "ongoing"));

        let err = validate_project(json!({"id": 6, "name": "Delta"})).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_budget_beyond_exact_range_rejected() {
        let err = validate_document(
            r#"{"employees": [{"name": "Bob", "phone": "2", "projects": [
                {"id": 1, "name": "A", "budget": 1, "status": "ongoing"},
                {"id": 2, "name": "B", "budget": 9007199254740993, "status": "ongoing"}
            ]}]}"#,
        )
        .unwrap_err();

        match err {
            Error::Schema { violations } => {
                assert!(violations[0].starts_with("/employees/0/projects/1/budget"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }

        let err = validate_project(json!({"id": 1, "name": "A", "budget": -9_007_199_254_740_993_i64, "status": "x"}))
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_budget_at_exact_limit_and_fractional_accepted() {
        let project = validate_project(json!({"id": 1, "name": "A", "budget": 9_007_199_254_740_992_u64, "status": "x"}))
            .unwrap();
        assert_eq!(project.budget, 9_007_199_254_740_992.0);

        let project = validate_project(json!({"id": 1, "name": "A", "budget": 1000.5, "status": "x"})).unwrap();
        assert_eq!(project.budget, 1000.5);
    }
}
